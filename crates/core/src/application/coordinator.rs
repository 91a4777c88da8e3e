// Dispatcher & Shutdown Coordinator
//
// Wiring: ingestion task -> work queue -> fast pool -> batch queue -> batch pool.
// Shutdown order: stop ingestion, signal + join fast workers, close the batch
// queue, join batch workers. The batch queue is only closed once nothing can
// produce into it.

use crate::application::handler::HandlerContext;
use crate::application::registry::CommandRegistry;
use crate::application::router::Router;
use crate::application::staleness::StalenessFilter;
use crate::application::stats::{DispatchStats, StatsSnapshot};
use crate::application::worker::{
    batch_queue, shutdown_channel, termination_channel, work_queue, BatchSender, BatchWorker,
    FastWorker, ShutdownSender, ShutdownToken, TerminationHandle, TerminationReason,
    TerminationWatch, WorkSender,
};
use crate::domain::DispatchConfig;
use crate::error::Result;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{Responder, TimeProvider, UpdateSource};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

/// Pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Ingestion active, both pools polling
    Running,
    /// Shutdown in progress
    Draining,
    /// Every worker joined
    Stopped,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Running => write!(f, "RUNNING"),
            PipelineState::Draining => write!(f, "DRAINING"),
            PipelineState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Result of a completed shutdown
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub state: PipelineState,
    pub stats: StatsSnapshot,
    /// Worker tasks that ended by panicking (outside handler isolation)
    pub worker_panics: usize,
}

/// Builder for the dispatch pipeline
pub struct Dispatcher {
    config: Arc<DispatchConfig>,
    registry: Arc<CommandRegistry>,
    responder: Arc<dyn Responder>,
    time_provider: Arc<dyn TimeProvider>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// The registry must be fully populated: it is read-only from here on.
    ///
    /// Fails if the config has an empty pool or a zero-capacity queue.
    pub fn new(
        config: DispatchConfig,
        registry: CommandRegistry,
        responder: Arc<dyn Responder>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            responder,
            time_provider: Arc::new(SystemTimeProvider),
            stats: Arc::new(DispatchStats::new()),
        })
    }

    /// Replace the clock used for staleness checks (tests)
    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    /// Spawn both pools and the ingestion task. Must be called inside a tokio runtime.
    pub fn start<S>(self, source: S) -> RunningPipeline
    where
        S: UpdateSource + 'static,
    {
        let config = self.config;
        info!(
            fast_workers = config.num_workers,
            batch_workers = config.num_batches,
            work_queue_len = config.work_queue_len,
            batch_queue_len = config.batch_queue_len,
            ttl_secs = config.ttl.as_secs(),
            "Starting dispatch pipeline"
        );

        let (termination, termination_watch) = termination_channel();
        let ctx = HandlerContext {
            responder: self.responder,
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&config),
            stats: Arc::clone(&self.stats),
            termination: termination.clone(),
        };

        let (work_tx, work_rx) = work_queue(config.work_queue_len);
        let (batch_tx, batch_rx) = batch_queue(config.batch_queue_len);

        let batch_workers = (0..config.num_batches)
            .map(|id| {
                let worker = BatchWorker::new(id, batch_rx.clone(), ctx.clone());
                tokio::spawn(worker.run())
            })
            .collect();
        drop(batch_rx);

        let router = Arc::new(Router::new(
            Arc::clone(&self.registry),
            StalenessFilter::new(config.ttl, self.time_provider),
        ));
        let (worker_stop, worker_token) = shutdown_channel();
        let fast_workers = (0..config.num_workers)
            .map(|id| {
                let worker = FastWorker::new(
                    id,
                    work_rx.clone(),
                    batch_tx.clone(),
                    Arc::clone(&router),
                    ctx.clone(),
                );
                tokio::spawn(worker.run(worker_token.clone()))
            })
            .collect();
        drop(work_rx);

        let (ingestion_stop, ingestion_token) = shutdown_channel();
        let ingestion = tokio::spawn(run_ingestion(
            Box::new(source),
            work_tx,
            ingestion_token,
            config.poll_timeout,
            Arc::clone(&self.stats),
            termination.clone(),
        ));

        let (state, _) = watch::channel(PipelineState::Running);
        RunningPipeline {
            state,
            ingestion_stop,
            ingestion,
            worker_stop,
            fast_workers,
            batch_tx: Some(batch_tx),
            batch_workers,
            termination,
            termination_watch,
            stats: self.stats,
        }
    }
}

/// A started pipeline; call [`RunningPipeline::shutdown`] to stop it
pub struct RunningPipeline {
    state: watch::Sender<PipelineState>,
    ingestion_stop: ShutdownSender,
    ingestion: JoinHandle<()>,
    worker_stop: ShutdownSender,
    fast_workers: Vec<JoinHandle<()>>,
    batch_tx: Option<BatchSender>,
    batch_workers: Vec<JoinHandle<()>>,
    termination: TerminationHandle,
    termination_watch: TerminationWatch,
    stats: Arc<DispatchStats>,
}

impl RunningPipeline {
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Observe state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Handle for external termination triggers (signal listeners)
    pub fn termination_handle(&self) -> TerminationHandle {
        self.termination.clone()
    }

    /// Wait until something requests termination: a handler (`quit`,
    /// `restart`), the ingestion task (source exhausted) or a signal listener
    /// holding a [`TerminationHandle`].
    pub async fn wait_for_termination(&mut self) -> TerminationReason {
        match self.termination_watch.wait().await {
            Some(reason) => reason,
            // Unreachable while `self.termination` is alive
            None => TerminationReason::SourceClosed,
        }
    }

    /// Drain and stop every task. Handlers already running are allowed to finish.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.state.send_replace(PipelineState::Draining);
        info!("Pipeline draining");
        let mut worker_panics = 0usize;

        info!("Stopping ingestion");
        self.ingestion_stop.shutdown();
        worker_panics += join_task("ingestion", self.ingestion).await;

        info!(count = self.fast_workers.len(), "Waiting for fast workers");
        self.worker_stop.shutdown();
        for handle in self.fast_workers.drain(..) {
            worker_panics += join_task("fast worker", handle).await;
        }

        // Fast workers held the only other senders; dropping ours closes the queue
        info!("Closing batch queue");
        drop(self.batch_tx.take());

        info!(count = self.batch_workers.len(), "Waiting for batch workers");
        for handle in self.batch_workers.drain(..) {
            worker_panics += join_task("batch worker", handle).await;
        }

        self.state.send_replace(PipelineState::Stopped);
        let stats = self.stats.snapshot();
        info!(
            executed = stats.executed(),
            forwarded = stats.forwarded,
            rejected_full = stats.rejected_full,
            expired = stats.expired,
            "Pipeline stopped"
        );
        ShutdownReport {
            state: PipelineState::Stopped,
            stats,
            worker_panics,
        }
    }
}

/// Await a task; returns 1 if it panicked
async fn join_task(kind: &str, handle: JoinHandle<()>) -> usize {
    match handle.await {
        Ok(()) => 0,
        Err(e) if e.is_panic() => {
            error!(task = kind, error = ?e, "Task panicked");
            1
        }
        Err(e) => {
            warn!(task = kind, error = ?e, "Task cancelled");
            0
        }
    }
}

/// Pull events from the source into the work queue until stopped.
///
/// Each pull is bounded by the poll timeout so the loop keeps cycling while
/// the platform is quiet. The work sender is dropped on exit.
async fn run_ingestion(
    mut source: Box<dyn UpdateSource>,
    work_tx: WorkSender,
    mut stop: ShutdownToken,
    poll_timeout: Duration,
    stats: Arc<DispatchStats>,
    termination: TerminationHandle,
) {
    info!(poll_timeout_secs = poll_timeout.as_secs(), "Ingestion started");
    loop {
        if stop.is_shutdown() {
            break;
        }
        let polled = tokio::select! {
            biased;
            _ = stop.wait() => break,
            polled = tokio::time::timeout(poll_timeout, source.next_event()) => polled,
        };
        let event = match polled {
            Ok(Some(event)) => event,
            Ok(None) => {
                info!("Update source exhausted");
                termination.request(TerminationReason::SourceClosed);
                break;
            }
            Err(_elapsed) => {
                trace!("Poll round elapsed without events");
                continue;
            }
        };

        let event_id = event.id;
        tokio::select! {
            biased;
            _ = stop.wait() => {
                warn!(event_id, "Ingestion stopped on a full work queue, event not queued");
                break;
            }
            sent = work_tx.send(event) => {
                if sent.is_err() {
                    warn!(event_id, "Work queue has no consumers, stopping ingestion");
                    break;
                }
                stats.record_ingested();
            }
        }
    }
    source.stop().await;
    info!("Ingestion stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::port::responder::mocks::RecordingResponder;
    use crate::port::update_source::mocks::ScriptedSource;

    fn dispatcher(config: DispatchConfig) -> Result<Dispatcher> {
        Dispatcher::new(
            config,
            CommandRegistry::new(),
            Arc::new(RecordingResponder::new()),
        )
    }

    #[test]
    fn test_zero_capacity_queue_is_rejected() {
        let no_batch_slots = DispatchConfig {
            batch_queue_len: 0,
            ..Default::default()
        };
        let no_work_slots = DispatchConfig {
            work_queue_len: 0,
            ..Default::default()
        };

        assert!(matches!(dispatcher(no_batch_slots), Err(AppError::Domain(_))));
        assert!(matches!(dispatcher(no_work_slots), Err(AppError::Domain(_))));
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let no_fast_workers = DispatchConfig {
            num_workers: 0,
            ..Default::default()
        };
        let no_batch_workers = DispatchConfig {
            num_batches: 0,
            ..Default::default()
        };

        assert!(matches!(dispatcher(no_fast_workers), Err(AppError::Domain(_))));
        assert!(matches!(dispatcher(no_batch_workers), Err(AppError::Domain(_))));
    }

    #[tokio::test]
    async fn test_valid_config_starts_and_stops() {
        let mut pipeline = dispatcher(DispatchConfig::default())
            .unwrap()
            .start(ScriptedSource::new(Vec::new()));

        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(
            pipeline.wait_for_termination().await,
            TerminationReason::SourceClosed
        );
        let report = pipeline.shutdown().await;
        assert_eq!(report.state, PipelineState::Stopped);
        assert_eq!(report.worker_panics, 0);
    }
}
