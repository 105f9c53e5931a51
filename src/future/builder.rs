use super::Future;
use super::core::{self, Shared};
use crate::signal;

use std::io;
use std::sync::Arc;
use std::thread;

/// Builder for configuring the thread a [`Future`] runs its task on.
///
/// [`Future::spawn`] and the arity constructors use the defaults. Use a
/// `Builder` to name the thread, pick its stack size, or to receive thread
/// creation failures as an [`io::Error`] instead of a panic.
///
/// # Examples
///
/// ```rust
/// use eventual::Builder;
///
/// let future = Builder::new()
///     .name("checksum")
///     .stack_size(256 * 1024)
///     .spawn(|| (1..=10).sum::<u32>())
///     .expect("spawn");
///
/// assert_eq!(*future.wait(), 55);
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    /// Name given to the background thread and its tracing span.
    name: Option<String>,

    /// Stack size of the background thread, in bytes.
    stack_size: Option<usize>,
}

impl Builder {
    /// Creates a `Builder` with the platform's default thread settings.
    pub fn new() -> Self {
        Self {
            name: None,
            stack_size: None,
        }
    }

    /// Names the background thread.
    ///
    /// The name shows up in panic messages and on the `task` tracing span.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size of the background thread.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0`.
    pub fn stack_size(mut self, size: usize) -> Self {
        assert!(size > 0, "stack_size must be > 0");

        self.stack_size = Some(size);
        self
    }

    /// Starts `task` on a new thread and returns a handle to its result.
    ///
    /// The thread is detached: nothing can interrupt it, and it runs to
    /// completion whether or not anyone waits. `R` must be `Sync` because
    /// every clone of the returned handle can borrow the result.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created. The task is
    /// dropped without running in that case.
    pub fn spawn<F, R>(self, task: F) -> io::Result<Future<R>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + Sync + 'static,
    {
        let (trigger, signal) = signal::pair();
        let shared = Arc::new(Shared::new(signal));

        let mut builder = thread::Builder::new();
        if let Some(name) = self.name.clone() {
            builder = builder.name(name);
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let remote = shared.clone();
        let name = self.name;
        tracing::trace!(name = ?name, "spawning background task");

        // The join handle is dropped, detaching the thread.
        builder.spawn(move || core::run(&remote, trigger, task, name.as_deref()))?;

        Ok(Future { shared })
    }
}

impl Default for Builder {
    /// Creates a default `Builder`.
    fn default() -> Self {
        Self::new()
    }
}
