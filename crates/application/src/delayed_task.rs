use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Single-shot delayed callback owned by one component instance.
///
/// Dropping the handle aborts the callback if it has not run yet.
#[derive(Debug)]
pub(crate) struct DelayedTask {
    handle: JoinHandle<()>,
}

impl DelayedTask {
    /// Runs `task` once `delay` has elapsed from now.
    ///
    /// The deadline is fixed at call time, not when the runtime first polls
    /// the spawned task.
    pub(crate) fn spawn<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task.await;
        });

        Self { handle }
    }

    /// Returns whether the callback has run or been aborted.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
