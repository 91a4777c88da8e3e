// `stat` - liveness check with process and dispatch statistics
// reason: sysinfo for cross-platform process memory

use async_trait::async_trait;
use herald_core::application::{
    CommandHandler, CommandRegistration, HandlerContext, HandlerError, Module, ModuleError,
};
use herald_core::domain::{DispatchConfig, Event, HumanDuration};
use std::fmt::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sysinfo::{Pid, System};
use tracing::debug;

pub struct StatModule;

impl StatModule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StatModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for StatModule {
    fn name(&self) -> &'static str {
        "stat"
    }

    fn init(&mut self, _config: &DispatchConfig) -> Result<Vec<CommandRegistration>, ModuleError> {
        let pid = sysinfo::get_current_pid().map_err(|e| ModuleError(e.to_string()))?;
        let handler = StatHandler {
            started: Instant::now(),
            pid,
            system: Mutex::new(System::new()),
        };
        Ok(vec![CommandRegistration::new("stat", Arc::new(handler))])
    }
}

pub struct StatHandler {
    started: Instant,
    pid: Pid,
    system: Mutex<System>,
}

impl StatHandler {
    /// Resident memory of this process in bytes
    fn resident_memory(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_process(self.pid);
        system.process(self.pid).map(|p| p.memory())
    }
}

#[async_trait]
impl CommandHandler for StatHandler {
    async fn execute(&self, ctx: &HandlerContext, event: &Event) -> Result<(), HandlerError> {
        debug!(event_id = event.id, "/stat");

        let uptime = HumanDuration::new(Duration::from_secs(self.started.elapsed().as_secs()));
        let mut text = format!("Uptime: {}\n", uptime);
        if let Some(bytes) = self.resident_memory() {
            let _ = writeln!(text, "Memory: {}", format_bytes(bytes));
        }

        let stats = ctx.stats.snapshot();
        let _ = writeln!(
            text,
            "Handled: {} fast, {} batch ({} failed, {} panicked)",
            stats.executed_fast, stats.executed_batch, stats.handler_failures, stats.handler_panics
        );
        let _ = write!(
            text,
            "Dropped: {} expired, {} over capacity",
            stats.expired, stats.rejected_full
        );

        ctx.reply(event, &text).await
    }

    fn describe(&self) -> &str {
        "Tells whether the bot is alive and reports statistics about the system and itself."
    }
}

/// Human-readable size; switches unit once the value exceeds ten of the next one
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    match bytes {
        b if b > 10 * GB => format!("{:.2}GB", b as f64 / GB as f64),
        b if b > 10 * MB => format!("{:.2}MB", b as f64 / MB as f64),
        b if b > 10 * KB => format!("{:.2}kB", b as f64 / KB as f64),
        b => format!("{}B", b),
    }
}
