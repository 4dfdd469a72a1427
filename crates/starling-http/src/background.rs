//! Work run after a response body has been fully sent.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use starling_core::StarlingResult;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A zero-argument async action owned by a response.
///
/// It runs once, after the final body event. Its error is returned to the
/// host as-is.
pub struct BackgroundTask {
    func: Box<dyn FnOnce() -> BoxFuture<'static, StarlingResult<()>> + Send>,
}

impl fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTask").finish_non_exhaustive()
    }
}

impl BackgroundTask {
    /// Wraps an async closure.
    ///
    /// # Examples
    ///
    /// ```
    /// use starling_http::BackgroundTask;
    ///
    /// let task = BackgroundTask::new(|| async {
    ///     tracing::info!("sending welcome email");
    ///     Ok(())
    /// });
    /// # drop(task);
    /// ```
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = StarlingResult<()>> + Send + 'static,
    {
        Self {
            func: Box::new(move || Box::pin(func())),
        }
    }

    /// Runs the task to completion.
    pub async fn run(self) -> StarlingResult<()> {
        (self.func)().await
    }
}

/// Runs an optional task; shared by every response variant.
pub(crate) async fn run_background(task: Option<BackgroundTask>) -> StarlingResult<()> {
    match task {
        Some(task) => {
            tracing::debug!("running background task");
            task.run().await
        }
        None => Ok(()),
    }
}
