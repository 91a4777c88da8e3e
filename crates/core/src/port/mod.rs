// Port Layer - Interfaces for external collaborators

pub mod responder;
pub mod state_store;
pub mod time_provider; // For deterministic testing
pub mod update_source;

// Re-exports
pub use responder::{Responder, ResponderError};
pub use state_store::{StateStore, StoreError};
pub use time_provider::TimeProvider;
pub use update_source::UpdateSource;
