//! Cancellation tokens.
//!
//! A [`CancellationToken`] is held by the caller and handed to
//! [`Future::wait_with`](crate::Future::wait_with). It can be cancelled
//! explicitly, it can carry a deadline, and it can have children that are
//! cancelled along with it.
//!
//! Cancelling a token only ends waits. It never reaches the task running
//! behind a future.

use crate::error::CancelError;
use crate::signal::{self, Signal, Trigger};

use crossbeam_channel::{Receiver, select};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

/// A cloneable handle for cooperative, wait-side cancellation.
///
/// Clones share state: cancelling one cancels all of them.
///
/// # Examples
///
/// ```rust
/// use eventual::{CancellationToken, CancelError};
///
/// let token = CancellationToken::new();
/// let child = token.child_token();
///
/// token.cancel();
///
/// assert!(child.is_cancelled());
/// assert_eq!(child.reason(), Some(CancelError::Cancelled));
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    /// First recorded cancellation reason. Set before `trigger` fires.
    reason: OnceLock<CancelError>,

    /// Fired on cancellation. `None` once fired.
    trigger: Mutex<Option<Trigger>>,
    signal: Signal,

    /// Already folded with every ancestor's deadline.
    deadline: Option<Instant>,

    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new(deadline: Option<Instant>) -> Self {
        let (trigger, signal) = signal::pair();

        Self {
            reason: OnceLock::new(),
            trigger: Mutex::new(Some(trigger)),
            signal,
            deadline,
            children: Mutex::new(Vec::new()),
        }
    }

    fn cancel_with(&self, reason: CancelError) {
        if self.reason.set(reason).is_err() {
            return;
        }

        tracing::debug!(%reason, "cancellation token fired");

        let trigger = lock(&self.trigger).take();
        if let Some(trigger) = trigger {
            trigger.fire();
        }

        let children = std::mem::take(&mut *lock(&self.children));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel_with(reason);
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl CancellationToken {
    /// Creates a token that is only cancelled by [`cancel`](Self::cancel).
    pub fn new() -> Self {
        Self::from_inner(Inner::new(None))
    }

    /// Creates a token that expires at `deadline`.
    ///
    /// A deadline in the past yields a token that is already expired.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::from_inner(Inner::new(Some(deadline)))
    }

    /// Creates a token that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_inner(Inner::new(Instant::now().checked_add(timeout)))
    }

    fn from_inner(inner: Inner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Creates a child token.
    ///
    /// The child is cancelled whenever this token is, with the same reason,
    /// and inherits its deadline. Cancelling the child leaves this token
    /// untouched.
    pub fn child_token(&self) -> Self {
        self.child(self.inner.deadline)
    }

    /// Creates a child token whose deadline is at most `timeout` from now.
    ///
    /// If this token's own deadline is earlier, that one is kept. A timeout
    /// too large to represent adds no deadline of its own.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now().checked_add(timeout);
        let deadline = match (self.inner.deadline, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        self.child(deadline)
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        let child = Arc::new(Inner::new(deadline));

        // The parent records its reason before draining `children`, so
        // checking the reason under the lock cannot miss a cancellation.
        let mut children = lock(&self.inner.children);
        match self.inner.reason.get() {
            Some(&reason) => child.cancel_with(reason),
            None => {
                children.retain(|weak| weak.strong_count() > 0);
                children.push(Arc::downgrade(&child));
            }
        }
        drop(children);

        Self { inner: child }
    }

    /// Cancels this token and all of its children.
    ///
    /// Idempotent. If the token was already cancelled, or had already
    /// expired, the first reason is kept.
    pub fn cancel(&self) {
        if self.inner.deadline_passed() {
            self.inner.cancel_with(CancelError::DeadlineExceeded);
        } else {
            self.inner.cancel_with(CancelError::Cancelled);
        }
    }

    /// Returns `true` if the token has been cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Returns why the token was cancelled, or `None` while it is live.
    pub fn reason(&self) -> Option<CancelError> {
        if self.inner.reason.get().is_none() && self.inner.deadline_passed() {
            self.inner.cancel_with(CancelError::DeadlineExceeded);
        }

        self.inner.reason.get().copied()
    }

    /// The point in time at which the token expires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Blocks the current thread until the token is cancelled or expires.
    pub fn cancelled(&self) -> CancelError {
        let timer = self.timer();

        select! {
            recv(self.inner.signal.receiver()) -> _ => self.recorded(),
            recv(timer) -> _ => self.expire(),
        }
    }

    /// Blocks until `done` becomes ready or this token is cancelled.
    ///
    /// `done` is any receiver that turns ready on completion, typically a
    /// disconnected completion signal. When both sides are ready, which one
    /// is reported is unspecified.
    pub(crate) fn race(&self, done: &Receiver<()>) -> Result<(), CancelError> {
        let timer = self.timer();

        select! {
            recv(done) -> _ => Ok(()),
            recv(self.inner.signal.receiver()) -> _ => Err(self.recorded()),
            recv(timer) -> _ => Err(self.expire()),
        }
    }

    fn timer(&self) -> Receiver<Instant> {
        match self.inner.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }

    fn expire(&self) -> CancelError {
        self.inner.cancel_with(CancelError::DeadlineExceeded);
        self.recorded()
    }

    fn recorded(&self) -> CancelError {
        // The reason is stored before the signal fires.
        self.inner
            .reason
            .get()
            .copied()
            .unwrap_or(CancelError::Cancelled)
    }
}

impl Default for CancellationToken {
    /// Returns a token with no deadline.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("reason", &self.inner.reason.get())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

/// Locks `mutex`, recovering the guard if a holder panicked.
///
/// Nothing guarded here can be left half-updated by a panic.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;

    #[test]
    fn test_new_token_is_live() {
        let token = CancellationToken::new();

        assert!(!token.is_cancelled());
        assert_eq!(token.reason(), None);
        assert_eq!(token.deadline(), None);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();

        assert_eq!(token.reason(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();

        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let token = CancellationToken::with_deadline(Instant::now());

        assert_eq!(token.reason(), Some(CancelError::DeadlineExceeded));
    }

    #[test]
    fn test_timeout_expires() {
        let token = CancellationToken::with_timeout(Duration::from_millis(20));
        assert!(!token.is_cancelled());

        let start = Instant::now();
        assert_eq!(token.cancelled(), CancelError::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_huge_timeout_never_expires() {
        let token = CancellationToken::with_timeout(Duration::MAX);

        assert_eq!(token.deadline(), None);
        assert!(!token.is_cancelled());

        let (_trigger, signal) = signal::pair();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        assert_eq!(token.race(signal.receiver()), Err(CancelError::Cancelled));
        handle.join().unwrap();
    }

    #[test]
    fn test_huge_child_timeout_keeps_parent_deadline() {
        let unbounded = CancellationToken::new();
        assert_eq!(unbounded.child_with_timeout(Duration::MAX).deadline(), None);

        let parent = CancellationToken::with_timeout(Duration::from_secs(60));
        let child = parent.child_with_timeout(Duration::MAX);

        assert_eq!(child.deadline(), parent.deadline());
        assert!(!child.is_cancelled());
    }

    #[test]
    fn test_explicit_cancel_before_deadline_keeps_reason() {
        let token = CancellationToken::with_timeout(Duration::from_millis(10));
        token.cancel();

        thread::sleep(Duration::from_millis(20));
        assert_eq!(token.reason(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_parent_cancels_child() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let grandchild = child.child_token();

        parent.cancel();

        assert_eq!(child.reason(), Some(CancelError::Cancelled));
        assert_eq!(grandchild.reason(), Some(CancelError::Cancelled));
    }

    #[test]
    fn test_child_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = CancellationToken::new();
        parent.cancel();

        assert!(parent.child_token().is_cancelled());
    }

    #[test]
    fn test_child_keeps_earlier_parent_deadline() {
        let parent = CancellationToken::with_timeout(Duration::from_millis(10));
        let child = parent.child_with_timeout(Duration::from_secs(60));

        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_child_timeout_tightens_deadline() {
        let parent = CancellationToken::with_timeout(Duration::from_secs(60));
        let child = parent.child_with_timeout(Duration::from_millis(10));

        assert!(child.deadline() < parent.deadline());
        assert_eq!(child.cancelled(), CancelError::DeadlineExceeded);
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_cancelled_wakes_on_cancel_from_other_thread() {
        let token = CancellationToken::new();
        let remote = token.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        assert_eq!(token.cancelled(), CancelError::Cancelled);
        handle.join().unwrap();
    }

    #[test]
    fn test_race_reports_done() {
        let token = CancellationToken::new();
        let (trigger, signal) = signal::pair();
        trigger.fire();

        assert_eq!(token.race(signal.receiver()), Ok(()));
    }

    #[test]
    fn test_race_reports_cancellation() {
        let token = CancellationToken::with_timeout(Duration::from_millis(10));
        let (_trigger, signal) = signal::pair();

        assert_eq!(
            token.race(signal.receiver()),
            Err(CancelError::DeadlineExceeded)
        );
    }
}
