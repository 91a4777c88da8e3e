// Router - fast path vs batch path, decided per event

use crate::application::handler::CommandHandler;
use crate::application::registry::CommandRegistry;
use crate::application::staleness::StalenessFilter;
use crate::domain::Event;
use std::fmt;
use std::sync::Arc;

/// Why an event was discarded without reaching a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Older than the TTL
    Expired,
    /// No text, plain text, or a malformed command
    NotACommand,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Expired => write!(f, "expired"),
            IgnoreReason::NotACommand => write!(f, "not a command"),
        }
    }
}

/// Routing decision for one event
pub enum Route {
    Ignore(IgnoreReason),
    /// Execute in the fast worker that dequeued it
    Fast(Arc<dyn CommandHandler>),
    /// Hand off to the batch pool
    Batch(Arc<dyn CommandHandler>),
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Ignore(reason) => f.debug_tuple("Ignore").field(reason).finish(),
            Route::Fast(_) => write!(f, "Fast"),
            Route::Batch(_) => write!(f, "Batch"),
        }
    }
}

pub struct Router {
    registry: Arc<CommandRegistry>,
    filter: StalenessFilter,
}

impl Router {
    pub fn new(registry: Arc<CommandRegistry>, filter: StalenessFilter) -> Self {
        Self { registry, filter }
    }

    /// Staleness first, then command extraction, then classification.
    /// Privilege is left to the handler.
    pub fn route(&self, event: &Event) -> Route {
        if self.filter.is_expired(event) {
            return Route::Ignore(IgnoreReason::Expired);
        }
        let Some(name) = event.command_name() else {
            return Route::Ignore(IgnoreReason::NotACommand);
        };
        let handler = self.registry.resolve(name);
        if handler.is_long_running() {
            Route::Batch(handler)
        } else {
            Route::Fast(handler)
        }
    }
}
