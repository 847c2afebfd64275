//! Task interfaces.
//!
//! A task is opaque asynchronous work supplied by the caller. It is
//! handed a [`Completion`] and must signal it once, from any thread.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::{error, warn};

type Callback<E> = Box<dyn FnOnce(Option<E>) + Send>;

/// Single-use completion handle passed to a task
///
/// Every signalling method consumes the handle, so a task cannot report
/// twice. A handle dropped without signalling leaves the chain stalled.
pub struct Completion<E> {
    callback: Option<Callback<E>>,
}

impl<E> Completion<E> {
    pub(crate) fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Option<E>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Report success
    pub fn succeed(self) {
        self.complete(None);
    }

    /// Report an error; the particle's policy decides what happens next
    pub fn fail(self, error: E) {
        self.complete(Some(error));
    }

    /// Report `None` for success or `Some(error)` for failure
    pub fn complete(mut self, error: Option<E>) {
        if let Some(callback) = self.callback.take() {
            callback(error);
        }
    }

    /// Report the outcome of a fallible operation
    pub fn finish(self, result: Result<(), E>) {
        self.complete(result.err());
    }
}

impl<E> Drop for Completion<E> {
    fn drop(&mut self) {
        if self.callback.is_some() {
            warn!("Completion dropped without being signalled, reaction will not settle");
        }
    }
}

/// Callback-driven unit of work
pub trait Task<E>: Send + Sync {
    /// Begin the work. `done` must eventually be signalled.
    fn start(&self, done: Completion<E>);
}

impl<E, F> Task<E> for F
where
    F: Fn(Completion<E>) + Send + Sync,
{
    fn start(&self, done: Completion<E>) {
        self(done)
    }
}

/// Work expressed as an async method
#[async_trait]
pub trait AsyncTask<E>: Send + Sync {
    /// Human-readable task name
    fn name(&self) -> &str {
        "async-task"
    }

    /// Perform the work
    async fn run(&self) -> Result<(), E>;
}

/// Adapts an [`AsyncTask`] into a [`Task`] by spawning it on the current
/// tokio runtime each time it is started.
pub struct Spawned<T> {
    inner: Arc<T>,
}

impl<T> Spawned<T> {
    pub fn new(task: T) -> Self {
        Self {
            inner: Arc::new(task),
        }
    }
}

impl<E, T> Task<E> for Spawned<T>
where
    E: Send + 'static,
    T: AsyncTask<E> + 'static,
{
    fn start(&self, done: Completion<E>) {
        let task = Arc::clone(&self.inner);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    done.finish(task.run().await);
                });
            }
            Err(e) => {
                error!(task = AsyncTask::<E>::name(&*task), error = %e, "No tokio runtime available to spawn task");
                drop(done);
            }
        }
    }
}

/// Adapts a closure returning a future into a [`Task`]
pub(crate) struct FutureTask<F> {
    factory: F,
}

impl<F> FutureTask<F> {
    pub(crate) fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<E, F, Fut> Task<E> for FutureTask<F>
where
    E: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    fn start(&self, done: Completion<E>) {
        let future = (self.factory)();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    done.finish(future.await);
                });
            }
            Err(e) => {
                error!(error = %e, "No tokio runtime available to spawn task");
                drop(done);
            }
        }
    }
}
