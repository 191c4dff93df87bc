use tokio::{
    runtime::Handle,
    task::{JoinError, JoinHandle},
};

use super::Executor;

/// [`Executor`] running work on a tokio runtime's blocking pool.
#[derive(Clone, Debug)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Default for TokioExecutor {
    /// Executor on the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Outside a tokio runtime.
    fn default() -> Self {
        Self {
            handle: Handle::current(),
        }
    }
}

impl Executor for TokioExecutor {
    type Error = JoinError;

    type JoinHandle<R>
        = JoinHandle<R>
    where
        R: Send + 'static;

    fn spawn_blocking<F, R>(&self, work: F) -> Self::JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.spawn_blocking(work)
    }
}
