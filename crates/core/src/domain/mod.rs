// Domain Layer - Pure data types and validation

pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod state;

// Re-exports
pub use config::{Config, DispatchConfig};
pub use duration::HumanDuration;
pub use error::DomainError;
pub use event::{ChatId, Command, Event, EventId, UserId};
pub use state::{BotState, MediaCache, MediaCacheEntry};
