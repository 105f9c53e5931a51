//! Thread-backed futures.
//!
//! A [`Future`] owns a task that started running on its own thread the moment
//! the future was created. Waiting for it blocks the calling thread until the
//! task has stored its result; a cancellable wait can give up early while
//! the task keeps running.
//!
//! One generic type covers every result shape. The four shapes in common use
//! have an alias and a constructor each:
//!
//! - [`ValueFuture`] / [`value`]: a plain value, no failure.
//! - [`ErrFuture`] / [`err`]: only a failure, no value.
//! - [`ResultFuture`] / [`result`]: a value or a failure.
//! - [`PairFuture`] / [`pair`]: two values or a failure.

mod builder;
mod core;

pub use builder::Builder;

use self::core::{Outcome, Shared};
use crate::context::CancellationToken;
use crate::error::CancelError;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A future yielding a single value and no failure.
pub type ValueFuture<T> = Future<T>;

/// A future yielding only a failure or success.
pub type ErrFuture<E> = Future<Result<(), E>>;

/// A future yielding a value or a failure.
pub type ResultFuture<T, E> = Future<Result<T, E>>;

/// A future yielding two values or a failure.
pub type PairFuture<A, B, E> = Future<Result<(A, B), E>>;

/// A handle to a task running on a background thread.
///
/// The task runs exactly once. Its result is written once, before the
/// handle can observe completion, and never changes afterwards, so every
/// wait after completion returns the same value.
///
/// Handles are cheap to clone; clones refer to the same task. Dropping every
/// handle does **not** stop the task; its result is simply discarded.
///
/// # Thread safety
///
/// The result must be `Send + Sync`. Any clone of the handle, on any thread,
/// can borrow the stored result through [`wait`](Self::wait), so a `Send`
/// but not `Sync` value such as `Cell<T>` is rejected:
///
/// ```rust,compile_fail
/// use std::cell::Cell;
///
/// let counter = eventual::value(|| Cell::new(0));
/// ```
///
/// Wrap such values in a `Mutex` to hand them across:
///
/// ```rust
/// use std::cell::Cell;
/// use std::sync::Mutex;
///
/// let counter = eventual::value(|| Mutex::new(Cell::new(0)));
/// let cell = counter.wait().lock().unwrap();
/// cell.set(cell.get() + 1);
///
/// assert_eq!(cell.get(), 1);
/// ```
///
/// # Panics
///
/// If the task panics, every wait on the future panics in the waiting thread
/// with the task's panic message.
pub struct Future<R> {
    pub(crate) shared: Arc<Shared<R>>,
}

impl<R> Future<R>
where
    R: Send + Sync + 'static,
{
    /// Starts `task` on a new thread and returns immediately.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread. Use
    /// [`Builder::spawn`] to handle that case as an error.
    pub fn spawn<F>(task: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
    {
        Builder::new()
            .spawn(task)
            .expect("failed to spawn background thread")
    }
}

impl<R> Future<R> {
    /// Blocks until the task completes and returns its result.
    ///
    /// Returns immediately once the task has completed.
    pub fn wait(&self) -> &R {
        self.shared.signal.wait();
        self.stored()
    }

    /// Blocks until the task completes or `token` is cancelled.
    ///
    /// Cancellation only ends this wait. The task keeps running, and a later
    /// call can still collect its result.
    ///
    /// If `token` is already cancelled, this returns without blocking. When
    /// the task has also completed by then, either outcome may be reported.
    ///
    /// # Errors
    ///
    /// Returns the token's [`CancelError`] if it fired first.
    pub fn wait_with(&self, token: &CancellationToken) -> Result<&R, CancelError> {
        match token.race(self.shared.signal.receiver()) {
            Ok(()) => Ok(self.stored()),
            Err(reason) => {
                tracing::debug!(%reason, "stopped waiting for background task");
                Err(reason)
            }
        }
    }

    /// Blocks for at most `timeout` waiting for the task.
    ///
    /// # Errors
    ///
    /// Returns [`CancelError::DeadlineExceeded`] if the task is still running
    /// when `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<&R, CancelError> {
        self.wait_with(&CancellationToken::with_timeout(timeout))
    }

    /// Returns `true` once the task has completed.
    pub fn is_finished(&self) -> bool {
        self.shared.signal.is_fired()
    }

    /// Returns the result if the task has completed, without blocking.
    pub fn try_get(&self) -> Option<&R> {
        if self.is_finished() {
            Some(self.stored())
        } else {
            None
        }
    }

    /// Reads the slot. Only valid once the signal has been observed.
    fn stored(&self) -> &R {
        match self.shared.slot.get() {
            Some(Outcome::Ready(value)) => value,
            Some(Outcome::Panicked(message)) => {
                panic!("background task panicked: {message}")
            }
            None => panic!("background task exited without storing a result"),
        }
    }
}

impl<T, E> Future<Result<T, E>> {
    /// Blocks until the task completes and returns a copy of its result.
    pub fn get(&self) -> Result<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.wait().clone()
    }

    /// Like [`get`](Self::get), but gives up when `token` is cancelled.
    ///
    /// On cancellation the token's reason is converted into `E`, so callers
    /// branch on a single failure value whichever side produced it.
    pub fn get_with(&self, token: &CancellationToken) -> Result<T, E>
    where
        T: Clone,
        E: Clone + From<CancelError>,
    {
        match self.wait_with(token) {
            Ok(result) => result.clone(),
            Err(reason) => Err(E::from(reason)),
        }
    }
}

impl<R> Clone for Future<R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<R> fmt::Debug for Future<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Runs `task` in the background; its result is a plain value.
///
/// # Examples
///
/// ```rust
/// let location = eventual::value(|| String::from("Mars"));
/// assert_eq!(location.wait(), "Mars");
/// ```
pub fn value<T, F>(task: F) -> ValueFuture<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + Sync + 'static,
{
    Future::spawn(task)
}

/// Runs `task` in the background; its result is only a failure or success.
///
/// # Examples
///
/// ```rust
/// let saved = eventual::err(|| Err::<(), _>("could not set name"));
/// assert_eq!(saved.get(), Err("could not set name"));
/// ```
pub fn err<E, F>(task: F) -> ErrFuture<E>
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: Send + Sync + 'static,
{
    Future::spawn(task)
}

/// Runs `task` in the background; its result is a value or a failure.
pub fn result<T, E, F>(task: F) -> ResultFuture<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    Future::spawn(task)
}

/// Runs `task` in the background; its result is two values or a failure.
///
/// # Examples
///
/// ```rust
/// let lookup = eventual::pair(|| Ok::<_, String>(("Full Name", 100)));
/// let (name, age) = lookup.get().unwrap();
///
/// assert_eq!(name, "Full Name");
/// assert_eq!(age, 100);
/// ```
pub fn pair<A, B, E, F>(task: F) -> PairFuture<A, B, E>
where
    F: FnOnce() -> Result<(A, B), E> + Send + 'static,
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    Future::spawn(task)
}
