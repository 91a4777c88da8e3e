// Command Handler capability set and the context handlers run with

use crate::application::registry::CommandRegistry;
use crate::application::stats::DispatchStats;
use crate::application::worker::constants::{PERMISSION_DENIED_REPLY, UNKNOWN_COMMAND_REPLY};
use crate::application::worker::TerminationHandle;
use crate::domain::{DispatchConfig, Event, UserId};
use crate::port::{Responder, ResponderError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Failure surfaced by a handler. Logged by the worker, never retried.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Reply failed: {0}")]
    Reply(#[from] ResponderError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Permission denied for user {0:?}")]
    PermissionDenied(Option<UserId>),

    #[error("{0}")]
    Failed(String),
}

/// A command implementation.
///
/// One instance serves every invocation of its command, possibly from several
/// workers at once, so implementations must be safe to share.
///
/// Defaults describe an ordinary command: quick and unprivileged.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle one event. Runs to completion; there is no preemption.
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError>;

    /// Help text: what it does and how to call it
    fn describe(&self) -> &str;

    /// Long-running commands go through the batch queue
    fn is_long_running(&self) -> bool {
        false
    }

    /// Privileged commands check the sender themselves (see [`HandlerContext::ensure_privileged`])
    fn requires_privilege(&self) -> bool {
        false
    }
}

/// Everything a handler may touch while executing
#[derive(Clone)]
pub struct HandlerContext {
    pub responder: Arc<dyn Responder>,
    pub registry: Arc<CommandRegistry>,
    pub config: Arc<DispatchConfig>,
    pub stats: Arc<DispatchStats>,
    pub termination: TerminationHandle,
}

impl HandlerContext {
    /// Reply to the conversation the event came from
    pub async fn reply(&self, event: &Event, text: &str) -> Result<(), HandlerError> {
        self.responder.send_text(event.chat_id, text).await?;
        Ok(())
    }

    /// Refuse (and tell the sender) unless the sender is an admin
    pub async fn ensure_privileged(&self, event: &Event) -> Result<(), HandlerError> {
        if self.config.is_admin(event.sender_id) {
            return Ok(());
        }
        let name = event.command_name().unwrap_or_default();
        self.reply(event, &format!("{}: {}", name, PERMISSION_DENIED_REPLY))
            .await?;
        Err(HandlerError::PermissionDenied(event.sender_id))
    }
}

/// Fallback for unregistered commands: quick, unprivileged, never fails dispatch
pub struct UnknownCommandHandler;

#[async_trait]
impl CommandHandler for UnknownCommandHandler {
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError> {
        let name = event.command_name().unwrap_or_default();
        let text = format!("{}: {}", name, UNKNOWN_COMMAND_REPLY);
        if let Err(e) = ctx.responder.send_text(event.chat_id, &text).await {
            warn!(
                event_id = event.id,
                chat_id = event.chat_id,
                command = name,
                error = %e,
                "Failed to report unknown command"
            );
        }
        Ok(())
    }

    fn describe(&self) -> &str {
        "invalid command"
    }
}
