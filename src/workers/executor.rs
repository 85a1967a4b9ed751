use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Runs fire-and-forget background work and keeps track of it so the
/// process can wait for in-flight tasks before exiting
#[derive(Clone, Default)]
pub struct TaskExecutor {
    tracker: TaskTracker,
    shut_down: Arc<AtomicBool>,
}

impl TaskExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task without waiting for it. Returns false once shut down.
    pub fn spawn<F>(&self, name: &str, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            warn!("Executor shut down, dropping task {}", name);
            return false;
        }

        debug!("Spawning background task {}", name);
        self.tracker.spawn(task);
        true
    }

    /// Number of tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Wait until every task spawned so far has finished, still accepting new ones
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;

        if !self.is_shut_down() {
            self.tracker.reopen();
        }
    }

    /// Stop accepting tasks and wait for the in-flight ones
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.tracker.close();

        info!("Waiting for {} background tasks", self.tracker.len());
        self.tracker.wait().await;
        info!("Background tasks finished");
    }
}
