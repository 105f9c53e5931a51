//! # Eventual
//!
//! **Eventual** runs a blocking computation on its own thread and lets the
//! caller collect the result later, optionally giving up early through a
//! cancellation token.
//!
//! There is no runtime, no pool and no executor: every [`Future`] is one
//! detached OS thread plus a write-once slot and a one-shot completion
//! signal. Cancellation acts on the *wait*, never on the task.
//!
//! It offers:
//!
//! - A single generic [`Future`] handle with blocking ([`Future::wait`]) and
//!   cancellable ([`Future::wait_with`]) retrieval
//! - Constructors for the four common result shapes: [`value`], [`err`],
//!   [`result`] and [`pair`]
//! - A [`CancellationToken`] with explicit cancel, deadlines and child tokens
//! - A [`Builder`] for naming and sizing the background thread
//!
//! ## Quick Start
//!
//! ```rust
//! use eventual::{CancelError, CancellationToken};
//! use std::thread;
//! use std::time::Duration;
//!
//! let user = eventual::result(|| {
//!     thread::sleep(Duration::from_millis(10));
//!     Ok::<_, String>("Full Name")
//! });
//!
//! // Do other work, then collect.
//! assert_eq!(user.get(), Ok("Full Name"));
//!
//! // A wait can be abandoned; the task itself keeps running.
//! let slow = eventual::value(|| thread::sleep(Duration::from_secs(1)));
//! let token = CancellationToken::new();
//! token.cancel();
//! assert_eq!(slow.wait_with(&token).err(), Some(CancelError::Cancelled));
//! ```
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`]. The crate never installs a
//! subscriber; background threads run inside a `task` span carrying the
//! name given to [`Builder::name`].

mod context;
mod error;
mod future;
mod signal;

pub use context::CancellationToken;
pub use error::CancelError;
pub use future::{
    Builder, ErrFuture, Future, PairFuture, ResultFuture, ValueFuture, err, pair, result, value,
};
