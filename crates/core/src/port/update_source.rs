// Ingestion Port (messaging platform adapter)

use crate::domain::Event;
use async_trait::async_trait;

/// Pull-based source of inbound events.
///
/// The ingestion task owns the source; dispatch never relies on the source
/// closing anything on its own, it stops pulling and calls [`UpdateSource::stop`].
#[async_trait]
pub trait UpdateSource: Send {
    /// Wait for the next event. `None` means the source is exhausted.
    ///
    /// Must be cancel-safe: the ingestion task drops this future on poll
    /// timeout and on shutdown.
    async fn next_event(&mut self) -> Option<Event>;

    /// Release the transport (end long-polling, close connections)
    async fn stop(&mut self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Yields a fixed script of events, then either ends or idles forever
    pub struct ScriptedSource {
        events: VecDeque<Event>,
        idle_when_empty: bool,
        stopped: Arc<AtomicBool>,
    }

    impl ScriptedSource {
        /// Source that reports exhaustion after the script
        pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
            Self {
                events: events.into_iter().collect(),
                idle_when_empty: false,
                stopped: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Source that blocks after the script, like a long-poll with no traffic
        pub fn new_idle(events: impl IntoIterator<Item = Event>) -> Self {
            Self {
                idle_when_empty: true,
                ..Self::new(events)
            }
        }

        /// Flag flipped when the ingestion task calls `stop`
        pub fn stopped_flag(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.stopped)
        }
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn next_event(&mut self) -> Option<Event> {
            match self.events.pop_front() {
                Some(event) => Some(event),
                None if self.idle_when_empty => std::future::pending().await,
                None => None,
            }
        }

        async fn stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }
}
