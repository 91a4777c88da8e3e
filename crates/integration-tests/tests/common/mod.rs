//! Shared fixtures for pipeline tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_core::application::{CommandHandler, HandlerContext, HandlerError};
use herald_core::domain::{DispatchConfig, Event};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Barrier, Semaphore};

/// What a [`Spy`] does when executed
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
    Sleep(Duration),
    /// Block until a permit is available (release with `add_permits`)
    Gate(Arc<Semaphore>),
    /// Rendezvous with other spies; fails if nobody shows up in time
    Rendezvous(Arc<Barrier>),
}

/// Handler that counts invocations and behaves as told
pub struct Spy {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    long: bool,
    behavior: Behavior,
}

impl Spy {
    pub fn quick(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self::new(false, behavior))
    }

    pub fn long(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self::new(true, behavior))
    }

    fn new(long: bool, behavior: Behavior) -> Self {
        Self {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            long,
            behavior,
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandHandler for Spy {
    async fn execute(&self, _ctx: &HandlerContext, _event: &Event) -> Result<(), HandlerError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let result = match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(HandlerError::Failed("spy failure".to_string())),
            Behavior::Panic => panic!("spy panic"),
            Behavior::Sleep(d) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
            Behavior::Gate(gate) => {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|e| HandlerError::Failed(e.to_string()))?;
                permit.forget();
                Ok(())
            }
            Behavior::Rendezvous(barrier) => {
                match tokio::time::timeout(Duration::from_secs(5), barrier.wait()).await {
                    Ok(_) => Ok(()),
                    Err(_) => Err(HandlerError::Failed("rendezvous timed out".to_string())),
                }
            }
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn describe(&self) -> &str {
        "test spy"
    }

    fn is_long_running(&self) -> bool {
        self.long
    }
}

/// Small pools and queues, generous TTL
pub fn config(workers: usize, batches: usize, batch_queue_len: usize) -> DispatchConfig {
    DispatchConfig {
        num_workers: workers,
        num_batches: batches,
        batch_queue_len,
        work_queue_len: 100,
        poll_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

/// Event in chat `100 + id`, arrived now
pub fn event(id: i64, text: &str) -> Event {
    event_at(id, text, Utc::now())
}

pub fn event_at(id: i64, text: &str, arrived_at: DateTime<Utc>) -> Event {
    Event::new(id, 100 + id, arrived_at, Some(text.to_string()))
}

/// Poll `condition` until it holds; panics after five seconds
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
