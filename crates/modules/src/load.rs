// `load` - samples CPU usage over several seconds (long-running, batch pool)
// reason: sysinfo for cross-platform CPU sampling

use async_trait::async_trait;
use herald_core::application::{
    CommandHandler, CommandRegistration, HandlerContext, HandlerError, Module, ModuleError,
};
use herald_core::domain::{DispatchConfig, Event};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tracing::debug;

/// Sampling window when no argument is given
pub const DEFAULT_SAMPLE_SECS: u64 = 5;

/// Longest accepted sampling window
pub const MAX_SAMPLE_SECS: u64 = 30;

pub struct LoadModule {
    interval: Duration,
}

impl LoadModule {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(1).max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl Default for LoadModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for LoadModule {
    fn name(&self) -> &'static str {
        "load"
    }

    fn init(&mut self, _config: &DispatchConfig) -> Result<Vec<CommandRegistration>, ModuleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ModuleError("CPU sampling is not supported on this system".into()));
        }
        let handler = LoadHandler {
            interval: self.interval,
        };
        Ok(vec![CommandRegistration::new("load", Arc::new(handler))])
    }
}

pub struct LoadHandler {
    interval: Duration,
}

impl LoadHandler {
    /// Average global CPU usage over `rounds` sampling intervals
    async fn sample(&self, rounds: u64) -> f32 {
        let mut system = System::new();
        system.refresh_cpu();

        let mut total = 0.0f32;
        for _ in 0..rounds {
            tokio::time::sleep(self.interval).await;
            system.refresh_cpu();
            total += system.global_cpu_info().cpu_usage();
        }
        total / rounds as f32
    }
}

#[async_trait]
impl CommandHandler for LoadHandler {
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError> {
        let secs = parse_window(event.command_args())?;
        debug!(event_id = event.id, secs, "/load sampling");

        let average = self.sample(secs).await;
        let load = System::load_average();
        let text = format!(
            "CPU usage over {}s: {:.1}%\nLoad average: {:.2} {:.2} {:.2}",
            secs, average, load.one, load.five, load.fifteen
        );
        ctx.reply(event, &text).await
    }

    fn describe(&self) -> &str {
        "Samples CPU usage. `/load [seconds]`, 1 to 30, default 5."
    }

    fn is_long_running(&self) -> bool {
        true
    }
}

/// Parse the optional window argument
fn parse_window(args: &str) -> Result<u64, HandlerError> {
    if args.is_empty() {
        return Ok(DEFAULT_SAMPLE_SECS);
    }
    match args.parse::<u64>() {
        Ok(secs) if (1..=MAX_SAMPLE_SECS).contains(&secs) => Ok(secs),
        _ => Err(HandlerError::InvalidArguments(format!(
            "expected seconds between 1 and {}, got {:?}",
            MAX_SAMPLE_SECS, args
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{command, context};
    use herald_core::application::CommandRegistry;

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("").unwrap(), DEFAULT_SAMPLE_SECS);
        assert_eq!(parse_window("1").unwrap(), 1);
        assert_eq!(parse_window("30").unwrap(), 30);
        assert!(matches!(
            parse_window("0"),
            Err(HandlerError::InvalidArguments(_))
        ));
        tokio_test::assert_err!(parse_window("31"));
        tokio_test::assert_err!(parse_window("soon"));
    }

    #[tokio::test]
    async fn test_load_replies_with_average() {
        let handler = LoadHandler {
            interval: Duration::from_millis(10).max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        };
        let t = context(CommandRegistry::new(), DispatchConfig::default());

        handler.execute(&t.ctx, &command("/load 1", 1)).await.unwrap();

        let sent = t.responder.sent_to(500);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("CPU usage over 1s: "));
    }

    #[tokio::test]
    async fn test_invalid_window_sends_nothing() {
        let t = context(CommandRegistry::new(), DispatchConfig::default());
        let result = LoadHandler {
            interval: Duration::from_millis(10),
        }
        .execute(&t.ctx, &command("/load 99", 1))
        .await;

        assert!(matches!(result, Err(HandlerError::InvalidArguments(_))));
        assert!(t.responder.sent().is_empty());
    }
}
