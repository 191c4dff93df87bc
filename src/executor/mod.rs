#[cfg(feature = "tokio")]
pub mod tokio;

use std::future::Future;

/// Runs blocking work off the caller's task.
///
/// Execution against the store is synchronous; an executor lets async
/// callers push it onto a blocking pool and await the outcome.
pub trait Executor: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    type JoinHandle<R>: Future<Output = Result<R, Self::Error>> + Send
    where
        R: Send + 'static;

    fn spawn_blocking<F, R>(&self, work: F) -> Self::JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static;
}
