use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project_lite::pin_project;

use super::OpResultSet;
use crate::Error;

pin_project! {
    /// Pending outcome of [`OpBatch::exec_async`](super::OpBatch::exec_async).
    ///
    /// Dropping the future does not abort the work already handed to the
    /// executor.
    #[must_use = "futures do nothing unless polled"]
    pub struct ExecFuture<H> {
        #[pin]
        handle: H,
    }
}

impl<H> ExecFuture<H> {
    pub(crate) fn new(handle: H) -> Self {
        Self { handle }
    }
}

impl<H, E> Future for ExecFuture<H>
where
    H: Future<Output = Result<Result<OpResultSet, Error>, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Output = Result<OpResultSet, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().handle.poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) => Poll::Ready(Err(Error::Join(Box::new(err)))),
            Poll::Pending => Poll::Pending,
        }
    }
}
