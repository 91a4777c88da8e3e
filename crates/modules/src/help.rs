// `help` - lists registered commands or describes one

use async_trait::async_trait;
use herald_core::application::{
    CommandHandler, CommandInfo, CommandRegistration, HandlerContext, HandlerError, Module,
    ModuleError,
};
use herald_core::domain::{DispatchConfig, Event};
use std::sync::Arc;

pub struct HelpModule;

impl Module for HelpModule {
    fn name(&self) -> &'static str {
        "help"
    }

    fn init(&mut self, _config: &DispatchConfig) -> Result<Vec<CommandRegistration>, ModuleError> {
        Ok(vec![CommandRegistration::new("help", Arc::new(HelpHandler))])
    }
}

pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError> {
        let commands = ctx.registry.commands();
        let wanted = event.command_args().trim_start_matches('/');

        let text = if wanted.is_empty() {
            overview(&commands)
        } else {
            match commands.iter().find(|c| c.name == wanted) {
                Some(info) => format!("/{}{}\n{}", info.name, markers(info), info.description),
                None => format!("{}: unknown command", wanted),
            }
        };
        ctx.reply(event, &text).await
    }

    fn describe(&self) -> &str {
        "Lists available commands. `/help <command>` describes a single one."
    }
}

fn overview(commands: &[CommandInfo]) -> String {
    let mut lines = vec!["Available commands:".to_string()];
    lines.extend(commands.iter().map(|info| {
        let summary = info.description.lines().next().unwrap_or_default();
        format!("/{}{} - {}", info.name, markers(info), summary)
    }));
    lines.join("\n")
}

fn markers(info: &CommandInfo) -> &'static str {
    match (info.long_running, info.privileged) {
        (true, true) => " [long, admin]",
        (true, false) => " [long]",
        (false, true) => " [admin]",
        (false, false) => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_modules;
    use crate::test_support::{command, context};
    use herald_core::application::build_registry;

    fn help_context() -> crate::test_support::TestContext {
        let config = DispatchConfig::default();
        let registry = build_registry(default_modules(), &config).unwrap();
        context(registry, config)
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let t = help_context();
        HelpHandler
            .execute(&t.ctx, &command("/help", 1))
            .await
            .unwrap();

        let sent = t.responder.sent_to(500);
        assert_eq!(sent.len(), 1);
        let text = &sent[0];
        assert!(text.starts_with("Available commands:"));
        for line in ["/stat - ", "/load [long] - ", "/quit [admin] - ", "/help - "] {
            assert!(text.contains(line), "{line:?} missing from {text}");
        }
    }

    #[tokio::test]
    async fn test_help_for_single_command() {
        let t = help_context();
        HelpHandler
            .execute(&t.ctx, &command("/help /restart", 1))
            .await
            .unwrap();

        let sent = t.responder.sent_to(500);
        assert!(sent[0].starts_with("/restart [admin]\n"));
    }

    #[tokio::test]
    async fn test_help_for_unknown_command() {
        let t = help_context();
        HelpHandler
            .execute(&t.ctx, &command("/help nope", 1))
            .await
            .unwrap();

        assert_eq!(t.responder.sent_to(500), vec!["nope: unknown command"]);
    }
}
