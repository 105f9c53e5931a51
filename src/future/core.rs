use crate::signal::{Signal, Trigger};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

/// What the background thread left behind.
pub(crate) enum Outcome<R> {
    /// The task returned normally.
    Ready(R),

    /// The task panicked; holds the panic message.
    Panicked(String),
}

/// State shared between a [`Future`](super::Future) and its background thread.
///
/// The thread is the only writer. It stores the outcome, then fires the
/// signal; readers wait for the signal before looking at the slot.
pub(crate) struct Shared<R> {
    pub(crate) slot: OnceLock<Outcome<R>>,
    pub(crate) signal: Signal,
}

impl<R> Shared<R> {
    pub(crate) fn new(signal: Signal) -> Self {
        Self {
            slot: OnceLock::new(),
            signal,
        }
    }
}

/// Runs `task` to completion on the current thread and publishes its outcome.
///
/// This is the body of every background thread. A panic inside the task is
/// caught and stored so that waiters are released instead of blocking forever.
pub(crate) fn run<F, R>(shared: &Shared<R>, trigger: Trigger, task: F, name: Option<&str>)
where
    F: FnOnce() -> R,
{
    let span = tracing::trace_span!("task", name = name.unwrap_or("anonymous"));
    let _enter = span.enter();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(value) => Outcome::Ready(value),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(%message, "background task panicked");
            Outcome::Panicked(message)
        }
    };

    if shared.slot.set(outcome).is_err() {
        // Each thread owns the only trigger for its slot.
        tracing::error!("result slot written twice");
    }

    trigger.fire();
    tracing::trace!("background task completed");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("Box<dyn Any>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;

    #[test]
    fn test_run_stores_then_fires() {
        let (trigger, signal) = signal::pair();
        let shared = Shared::new(signal);

        run(&shared, trigger, || 7, None);

        assert!(shared.signal.is_fired());
        assert!(matches!(shared.slot.get(), Some(Outcome::Ready(7))));
    }

    #[test]
    fn test_run_catches_panic() {
        let (trigger, signal) = signal::pair();
        let shared: Shared<u8> = Shared::new(signal);

        run(&shared, trigger, || panic!("kaboom"), Some("panicky"));

        assert!(shared.signal.is_fired());
        match shared.slot.get() {
            Some(Outcome::Panicked(message)) => assert_eq!(message, "kaboom"),
            _ => panic!("expected a stored panic"),
        }
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let opaque: Box<dyn Any + Send> = Box::new(3_u32);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(opaque.as_ref()), "Box<dyn Any>");
    }
}
