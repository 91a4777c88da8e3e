// Workers - fast-path pool and batch pool

mod batch;
pub mod constants;
mod panic_guard;
mod queue;
mod shutdown;

pub use batch::BatchWorker;
pub use panic_guard::{execute_guarded, ExecutionOutcome};
pub use queue::{
    batch_queue, work_queue, BatchJob, BatchQueue, BatchSender, EnqueueError, WorkQueue,
    WorkSender,
};
pub use shutdown::{
    shutdown_channel, termination_channel, ShutdownSender, ShutdownToken, TerminationHandle,
    TerminationReason, TerminationWatch,
};

use crate::application::handler::{CommandHandler, HandlerContext};
use crate::application::router::{IgnoreReason, Route, Router};
use crate::domain::Event;
use constants::BATCH_QUEUE_FULL_REPLY;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a fast worker did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// Ran on the fast path
    Executed(ExecutionOutcome),
    /// Queued for the batch pool
    Forwarded,
    /// Batch queue full: dropped, sender told to try later
    RejectedFull,
    /// Batch queue closed: dropped (shutdown ordering violated)
    RejectedClosed,
}

/// Which pool ran a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Fast,
    Batch,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Fast => write!(f, "fast"),
            Pool::Batch => write!(f, "batch"),
        }
    }
}

/// Fast-path worker: takes events off the work queue, runs quick commands
/// inline and forwards long-running ones to the batch queue
pub struct FastWorker {
    id: usize,
    queue: WorkQueue,
    batch: BatchSender,
    router: Arc<Router>,
    ctx: HandlerContext,
}

impl FastWorker {
    pub fn new(
        id: usize,
        queue: WorkQueue,
        batch: BatchSender,
        router: Arc<Router>,
        ctx: HandlerContext,
    ) -> Self {
        Self {
            id,
            queue,
            batch,
            router,
            ctx,
        }
    }

    /// Run until shutdown is signalled (or the work queue closes).
    ///
    /// On shutdown, whatever is still queued is resolved before returning;
    /// ingestion is stopped before the signal, so the queue only shrinks.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(worker = self.id, "Fast worker started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            let next = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                event = self.queue.recv() => event,
            };
            match next {
                Some(event) => {
                    self.dispatch(event).await;
                }
                None => {
                    info!(worker = self.id, "Work queue closed");
                    break;
                }
            }
        }

        let mut drained = 0usize;
        while let Some(event) = self.queue.try_recv().await {
            self.dispatch(event).await;
            drained += 1;
        }
        info!(worker = self.id, drained, "Fast worker stopped");
    }

    /// Route one event and act on the decision
    pub async fn dispatch(&self, event: Event) -> DispatchOutcome {
        match self.router.route(&event) {
            Route::Ignore(reason) => {
                match reason {
                    IgnoreReason::Expired => self.ctx.stats.record_expired(),
                    IgnoreReason::NotACommand => self.ctx.stats.record_ignored(),
                }
                debug!(worker = self.id, event_id = event.id, %reason, "Event discarded");
                DispatchOutcome::Ignored(reason)
            }
            Route::Fast(handler) => {
                let outcome = invoke(self.id, Pool::Fast, handler, self.ctx.clone(), event).await;
                DispatchOutcome::Executed(outcome)
            }
            Route::Batch(handler) => self.forward(BatchJob { event, handler }).await,
        }
    }

    async fn forward(&self, job: BatchJob) -> DispatchOutcome {
        let stats = &self.ctx.stats;
        match self.batch.try_enqueue(job) {
            Ok(()) => {
                stats.record_forwarded();
                debug!(worker = self.id, "Forwarded to batch queue");
                DispatchOutcome::Forwarded
            }
            Err(EnqueueError::Full(job)) => {
                stats.record_rejected_full();
                let event = job.event;
                let command = event.command_name().unwrap_or_default();
                warn!(
                    worker = self.id,
                    event_id = event.id,
                    chat_id = event.chat_id,
                    command,
                    "Batch queue full, dropping event"
                );
                let text = format!("{}: {}", command, BATCH_QUEUE_FULL_REPLY);
                if let Err(e) = self.ctx.responder.send_text(event.chat_id, &text).await {
                    warn!(
                        worker = self.id,
                        event_id = event.id,
                        error = %e,
                        "Failed to report full batch queue"
                    );
                }
                DispatchOutcome::RejectedFull
            }
            Err(EnqueueError::Closed(job)) => {
                stats.record_closed_enqueue();
                error!(
                    worker = self.id,
                    event_id = job.event.id,
                    "Batch queue closed while a fast worker was running, dropping event"
                );
                DispatchOutcome::RejectedClosed
            }
        }
    }
}

/// Run a handler with panic isolation and record the result
pub(crate) async fn invoke(
    worker: usize,
    pool: Pool,
    handler: Arc<dyn CommandHandler>,
    ctx: HandlerContext,
    event: Event,
) -> ExecutionOutcome {
    let event_id = event.id;
    let chat_id = event.chat_id;
    let command = event.command_name().unwrap_or_default().to_string();
    let stats = Arc::clone(&ctx.stats);

    debug!(worker, %pool, event_id, chat_id, command = %command, "Executing command");
    let outcome = execute_guarded(handler, ctx, event).await;

    match pool {
        Pool::Fast => stats.record_executed_fast(),
        Pool::Batch => stats.record_executed_batch(),
    }
    match &outcome {
        ExecutionOutcome::Completed => {
            debug!(worker, %pool, event_id, command = %command, "Command handled");
        }
        ExecutionOutcome::Failed(e) => {
            stats.record_handler_failure();
            error!(
                worker,
                %pool,
                event_id,
                chat_id,
                command = %command,
                error = %e,
                "Command handler failed"
            );
        }
        ExecutionOutcome::Panicked(msg) => {
            stats.record_handler_panic();
            error!(
                worker,
                %pool,
                event_id,
                chat_id,
                command = %command,
                panic_msg = %msg,
                "Command handler panicked"
            );
        }
    }
    outcome
}
