use thiserror::Error;

/// Reason a cancellable wait returned before its task completed.
///
/// A `CancelError` is produced at the waiting layer only. It is never stored
/// in a [`Future`](crate::Future): after a cancelled wait, a later
/// [`wait`](crate::Future::wait) still yields the task's real result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CancelError {
    /// The token was cancelled explicitly.
    #[error("operation cancelled")]
    Cancelled,

    /// The token's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl CancelError {
    /// Returns `true` if the wait ended because a deadline passed.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, CancelError::DeadlineExceeded)
    }
}
