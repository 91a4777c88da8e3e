// Dispatch counters, shared across workers via Arc

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the ingestion task and both pools
#[derive(Debug, Default)]
pub struct DispatchStats {
    ingested: AtomicU64,
    expired: AtomicU64,
    ignored: AtomicU64,
    executed_fast: AtomicU64,
    forwarded: AtomicU64,
    rejected_full: AtomicU64,
    closed_enqueues: AtomicU64,
    executed_batch: AtomicU64,
    handler_failures: AtomicU64,
    handler_panics: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub ingested: u64,
    pub expired: u64,
    pub ignored: u64,
    pub executed_fast: u64,
    pub forwarded: u64,
    pub rejected_full: u64,
    pub closed_enqueues: u64,
    pub executed_batch: u64,
    pub handler_failures: u64,
    pub handler_panics: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingested(&self) {
        bump(&self.ingested);
    }

    pub fn record_expired(&self) {
        bump(&self.expired);
    }

    pub fn record_ignored(&self) {
        bump(&self.ignored);
    }

    pub fn record_executed_fast(&self) {
        bump(&self.executed_fast);
    }

    pub fn record_forwarded(&self) {
        bump(&self.forwarded);
    }

    pub fn record_rejected_full(&self) {
        bump(&self.rejected_full);
    }

    pub fn record_closed_enqueue(&self) {
        bump(&self.closed_enqueues);
    }

    pub fn record_executed_batch(&self) {
        bump(&self.executed_batch);
    }

    pub fn record_handler_failure(&self) {
        bump(&self.handler_failures);
    }

    pub fn record_handler_panic(&self) {
        bump(&self.handler_panics);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            ingested: load(&self.ingested),
            expired: load(&self.expired),
            ignored: load(&self.ignored),
            executed_fast: load(&self.executed_fast),
            forwarded: load(&self.forwarded),
            rejected_full: load(&self.rejected_full),
            closed_enqueues: load(&self.closed_enqueues),
            executed_batch: load(&self.executed_batch),
            handler_failures: load(&self.handler_failures),
            handler_panics: load(&self.handler_panics),
        }
    }
}

impl StatsSnapshot {
    /// Events that reached a handler on either path
    pub fn executed(&self) -> u64 {
        self.executed_fast + self.executed_batch
    }
}
