// Work & Batch Queues
//
// Both are bounded tokio mpsc channels. Consumers share the receiver behind a
// mutex so a pool of workers can drain one queue; the lock is held only while
// waiting for the next item, never while handling it.

use crate::application::handler::CommandHandler;
use crate::domain::Event;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

/// Create the work queue: ingestion -> fast workers
pub fn work_queue(capacity: usize) -> (WorkSender, WorkQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        WorkSender { tx },
        WorkQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side of the work queue, owned by the ingestion task
pub struct WorkSender {
    tx: mpsc::Sender<Event>,
}

impl WorkSender {
    /// Wait for room and enqueue. Gives the event back if every consumer is gone.
    pub async fn send(&self, event: Event) -> Result<(), Event> {
        self.tx.send(event).await.map_err(|e| e.0)
    }
}

/// Consumer side of the work queue, cloned into every fast worker
#[derive(Clone)]
pub struct WorkQueue {
    rx: Arc<Mutex<mpsc::Receiver<Event>>>,
}

impl WorkQueue {
    /// Next event; `None` once the sender is dropped and the queue is empty.
    /// Cancel-safe.
    pub async fn recv(&self) -> Option<Event> {
        self.rx.lock().await.recv().await
    }

    /// Next event if one is already queued
    pub async fn try_recv(&self) -> Option<Event> {
        self.rx.lock().await.try_recv().ok()
    }
}

/// A long-running command on its way to the batch pool, with the handler
/// already resolved so the batch worker does no routing
pub struct BatchJob {
    pub event: Event,
    pub handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for BatchJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchJob")
            .field("event_id", &self.event.id)
            .field("command", &self.event.command_name())
            .finish()
    }
}

/// Why a job could not be queued. The job is handed back.
#[derive(Debug)]
pub enum EnqueueError {
    /// Queue at capacity (backpressure: the job is dropped by the caller)
    Full(BatchJob),
    /// Queue already closed; never happens under the shutdown ordering
    Closed(BatchJob),
}

/// Create the batch queue: fast workers -> batch workers
pub fn batch_queue(capacity: usize) -> (BatchSender, BatchQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        BatchSender { tx },
        BatchQueue {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side of the batch queue.
///
/// The queue closes when the last sender is dropped; the coordinator keeps one
/// and drops it only after every fast worker has exited.
#[derive(Clone)]
pub struct BatchSender {
    tx: mpsc::Sender<BatchJob>,
}

impl BatchSender {
    /// Enqueue without waiting
    pub fn try_enqueue(&self, job: BatchJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => EnqueueError::Full(job),
            TrySendError::Closed(job) => EnqueueError::Closed(job),
        })
    }
}

/// Consumer side of the batch queue, cloned into every batch worker
#[derive(Clone)]
pub struct BatchQueue {
    rx: Arc<Mutex<mpsc::Receiver<BatchJob>>>,
}

impl BatchQueue {
    /// Next job; `None` once the queue is closed and drained
    pub async fn recv(&self) -> Option<BatchJob> {
        self.rx.lock().await.recv().await
    }
}
