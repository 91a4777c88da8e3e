// Command Registry - name -> handler, populated once before dispatch starts

use crate::application::handler::{CommandHandler, UnknownCommandHandler};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Registration errors. Both are programming errors, fatal at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command already registered: {0}")]
    DuplicateCommand(String),

    #[error("Invalid command name: {0:?}")]
    InvalidName(String),
}

/// One row of `help` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub long_running: bool,
    pub privileged: bool,
}

/// Maps command names to handlers.
///
/// Built single-threaded during startup, then shared read-only behind an `Arc`,
/// so lookups need no locking.
pub struct CommandRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
    fallback: Arc<dyn CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(UnknownCommandHandler))
    }

    /// Use a custom handler for unknown commands
    pub fn with_fallback(fallback: Arc<dyn CommandHandler>) -> Self {
        Self {
            handlers: BTreeMap::new(),
            fallback,
        }
    }

    /// Register a handler. A name is taken by the first registration;
    /// later attempts are rejected and the original stays in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        validate_name(&name)?;
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Look up a handler; unknown names get the fallback handler
    pub fn resolve(&self, name: &str) -> Arc<dyn CommandHandler> {
        match self.handlers.get(name) {
            Some(handler) => Arc::clone(handler),
            None => Arc::clone(&self.fallback),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered commands in name order
    pub fn commands(&self) -> Vec<CommandInfo> {
        self.handlers
            .iter()
            .map(|(name, handler)| CommandInfo {
                name: name.clone(),
                description: handler.describe().to_string(),
                long_running: handler.is_long_running(),
                privileged: handler.requires_privilege(),
            })
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && !name.starts_with('/')
        && !name.contains('@')
        && !name.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}
