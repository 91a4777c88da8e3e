// Batch worker - runs long-running commands off the batch queue

use super::{invoke, BatchQueue, Pool};
use crate::application::handler::HandlerContext;
use tracing::info;

/// Batch-pool worker.
///
/// Has no stop signal of its own: it exits when the batch queue is closed and
/// drained, which the coordinator does only after the fast pool is gone.
pub struct BatchWorker {
    id: usize,
    queue: BatchQueue,
    ctx: HandlerContext,
}

impl BatchWorker {
    pub fn new(id: usize, queue: BatchQueue, ctx: HandlerContext) -> Self {
        Self { id, queue, ctx }
    }

    pub async fn run(self) {
        info!(worker = self.id, "Batch worker started");
        let mut handled = 0usize;
        while let Some(job) = self.queue.recv().await {
            invoke(self.id, Pool::Batch, job.handler, self.ctx.clone(), job.event).await;
            handled += 1;
        }
        info!(worker = self.id, handled, "Batch worker stopped");
    }
}
