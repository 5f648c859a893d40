use std::future::Future;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Fixed-size pool of in-flight tasks.
///
/// The caller fills the pool while [`WorkerPool::has_capacity`] holds and then
/// waits on [`WorkerPool::join_next`]; each completion frees one slot, so
/// finished work is what drives further dispatch. Once the token is cancelled
/// the pool refuses new work and only drains what is already running.
pub struct WorkerPool<T> {
    tasks: JoinSet<T>,
    limit: usize,
    cancel: CancellationToken,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(limit: usize, cancel: CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            limit: limit.max(1),
            cancel,
        }
    }

    pub fn has_capacity(&self) -> bool {
        !self.cancel.is_cancelled() && self.tasks.len() < self.limit
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Spawns a task. Callers check [`WorkerPool::has_capacity`] first.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Next finished task, or `None` when nothing is running.
    pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
        self.tasks.join_next().await
    }
}
