// `quit` / `restart` - privileged lifecycle commands
//
// Both only request termination; the daemon performs the shutdown and picks
// the exit code from the reason.

use async_trait::async_trait;
use herald_core::application::{
    CommandHandler, CommandRegistration, HandlerContext, HandlerError, Module, ModuleError,
    TerminationReason,
};
use herald_core::domain::{DispatchConfig, Event};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AdminModule;

impl Module for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn init(&mut self, config: &DispatchConfig) -> Result<Vec<CommandRegistration>, ModuleError> {
        if config.admins.is_empty() {
            warn!("No admins configured, quit/restart will refuse everyone");
        }
        Ok(vec![
            CommandRegistration::new("quit", Arc::new(LifecycleHandler::quit())),
            CommandRegistration::new("restart", Arc::new(LifecycleHandler::restart())),
        ])
    }
}

pub struct LifecycleHandler {
    reason: TerminationReason,
    reply: &'static str,
    description: &'static str,
}

impl LifecycleHandler {
    pub fn quit() -> Self {
        Self {
            reason: TerminationReason::Quit,
            reply: "Shutting down.",
            description: "Stops the bot. Admins only.",
        }
    }

    pub fn restart() -> Self {
        Self {
            reason: TerminationReason::Restart,
            reply: "Restarting.",
            description: "Restarts the bot. Admins only.",
        }
    }
}

#[async_trait]
impl CommandHandler for LifecycleHandler {
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError> {
        ctx.ensure_privileged(event).await?;

        info!(sender = ?event.sender_id, reason = %self.reason, "Termination requested");
        ctx.reply(event, self.reply).await?;
        if !ctx.termination.request(self.reason.clone()) {
            info!("Termination already in progress");
        }
        Ok(())
    }

    fn describe(&self) -> &str {
        self.description
    }

    fn requires_privilege(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{command, context};
    use herald_core::application::CommandRegistry;
    use herald_core::domain::Config;

    fn admin_config() -> DispatchConfig {
        Config {
            admins: vec![42],
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    #[tokio::test]
    async fn test_admin_can_quit() {
        let mut t = context(CommandRegistry::new(), admin_config());

        LifecycleHandler::quit()
            .execute(&t.ctx, &command("/quit", 42))
            .await
            .unwrap();

        assert_eq!(t.responder.sent_to(500), vec!["Shutting down."]);
        assert_eq!(t.termination.wait().await, Some(TerminationReason::Quit));
    }

    #[tokio::test]
    async fn test_non_admin_is_refused() {
        let t = context(CommandRegistry::new(), admin_config());

        let result = LifecycleHandler::restart()
            .execute(&t.ctx, &command("/restart", 7))
            .await;

        assert!(matches!(result, Err(HandlerError::PermissionDenied(Some(7)))));
        assert_eq!(t.responder.sent_to(500), vec!["restart: permission denied"]);
        assert_eq!(t.ctx.termination.requested(), None);
    }

    #[tokio::test]
    async fn test_second_request_keeps_first_reason() {
        let t = context(CommandRegistry::new(), admin_config());

        LifecycleHandler::restart()
            .execute(&t.ctx, &command("/restart", 42))
            .await
            .unwrap();
        LifecycleHandler::quit()
            .execute(&t.ctx, &command("/quit", 42))
            .await
            .unwrap();

        assert_eq!(t.ctx.termination.requested(), Some(TerminationReason::Restart));
    }
}
