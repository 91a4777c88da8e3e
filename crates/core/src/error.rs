// Crate-wide error type (startup and wiring failures)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::application::registry::RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] crate::port::StoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;
