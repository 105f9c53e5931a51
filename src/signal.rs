//! One-shot completion signal.
//!
//! A [`Trigger`] fires exactly once, either explicitly or when it is
//! dropped. Any number of [`Signal`] clones observe the transition,
//! including clones created after the fact.
//!
//! The signal is a zero-capacity channel on which nothing is ever sent.
//! Firing drops the only sender, which disconnects every receiver at once.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Creates a connected `Trigger` / `Signal` pair in the pending state.
pub(crate) fn pair() -> (Trigger, Signal) {
    let (tx, rx) = crossbeam_channel::bounded(0);

    (Trigger { _tx: tx }, Signal { rx })
}

/// The write side of a completion signal.
///
/// Consumed by [`fire`](Trigger::fire). Dropping it without firing
/// has the same effect, so an unwinding producer still releases its waiters.
pub(crate) struct Trigger {
    _tx: Sender<()>,
}

impl Trigger {
    /// Fires the signal, waking every waiter.
    pub(crate) fn fire(self) {
        drop(self);
    }
}

/// The observing side of a completion signal.
#[derive(Clone)]
pub(crate) struct Signal {
    rx: Receiver<()>,
}

impl Signal {
    /// Blocks until the signal has fired.
    ///
    /// Returns immediately if it already has.
    pub(crate) fn wait(&self) {
        // Nothing is ever sent, so the only way out is disconnection.
        let _ = self.rx.recv();
    }

    /// Returns `true` once the signal has fired.
    pub(crate) fn is_fired(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// The receiver to hand to `crossbeam_channel::select!`.
    ///
    /// A `recv` on it becomes ready, with an error, once the signal fires.
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
