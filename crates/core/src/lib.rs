// Herald Core - Domain Logic, Ports & Dispatch Pipeline
// NO adapter dependencies (transport, storage and system metrics live elsewhere)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};
