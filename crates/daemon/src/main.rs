//! Herald - Main Entry Point
//!
//! Loads the persisted state, builds the command registry, runs the dispatch
//! pipeline against the console adapters until a signal or an admin command
//! asks it to stop, then stores the state back.

mod console;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use console::{ConsoleResponder, StdinSource};
use herald_core::application::{build_registry, Dispatcher, TerminationHandle, TerminationReason};
use herald_core::domain::{BotState, Config, HumanDuration};
use herald_core::port::{StateStore, StoreError};
use herald_infra_store::FileStateStore;
use herald_modules::default_modules;
use logging::LogFormat;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_ROOT: &str = "~/.herald";

/// Exit status after `restart`, for the supervisor
const EXIT_RESTART: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Chat bot command dispatcher", long_about = None)]
#[command(version)]
struct Args {
    /// Working directory holding the state file
    #[arg(long, env = "HERALD_ROOT", default_value = DEFAULT_ROOT)]
    root: String,

    /// Fast-path worker count
    #[arg(long, env = "HERALD_WORKERS")]
    workers: Option<usize>,

    /// Batch worker count
    #[arg(long, env = "HERALD_BATCHES")]
    batches: Option<usize>,

    /// Event time-to-live, e.g. 24h, 1h30m, 45s
    #[arg(long, env = "HERALD_TTL")]
    ttl: Option<HumanDuration>,

    /// Long-poll timeout in seconds
    #[arg(long, env = "HERALD_POLL_TIMEOUT")]
    poll_timeout: Option<u64>,

    #[arg(long, env = "HERALD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Args {
    fn root_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.root).into_owned())
    }

    /// Command-line values win over persisted ones (and get persisted)
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.num_workers = workers;
        }
        if let Some(batches) = self.batches {
            config.num_batches = batches;
        }
        if let Some(ttl) = self.ttl {
            config.ttl = Some(ttl);
        }
        if let Some(poll_timeout) = self.poll_timeout {
            config.poll_timeout = poll_timeout;
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_format)?;

    info!("Herald v{} starting...", VERSION);

    let root = args.root_dir();
    std::fs::create_dir_all(&root)
        .with_context(|| format!("Cannot create root directory {}", root.display()))?;
    let store = FileStateStore::new(&root);

    let mut state = load_state(&store, root)?;
    args.apply(&mut state.global_config);

    // A panic here still leaves a copy of the state behind
    let outcome = AssertUnwindSafe(run(&state.global_config)).catch_unwind().await;
    let reason = match outcome {
        Ok(result) => result?,
        Err(panic) => {
            error!("Main task panicked, storing a copy of the state");
            if let Err(e) = store.store_panicked(&state) {
                error!(error = %e, "Failed to store panicked state");
            }
            std::panic::resume_unwind(panic);
        }
    };

    store.store(&state).context("Failed to store state")?;
    info!(%reason, "Shutdown complete.");

    Ok(match reason {
        TerminationReason::Restart => ExitCode::from(EXIT_RESTART),
        _ => ExitCode::SUCCESS,
    })
}

/// Start from defaults when there is no state yet; refuse a damaged one
fn load_state(store: &FileStateStore, root: PathBuf) -> Result<BotState> {
    match store.load() {
        Ok(state) => Ok(state),
        Err(StoreError::NotFound(path)) => {
            warn!(path = %path, "No state file, starting with defaults");
            let mut state = BotState::default();
            state.global_config.root = root;
            Ok(state)
        }
        Err(e) => Err(e).context("Failed to load state"),
    }
}

async fn run(config: &Config) -> Result<TerminationReason> {
    let dispatch = config.resolve().context("Invalid configuration")?;
    let registry = build_registry(default_modules(), &dispatch)?;
    info!(commands = registry.len(), "Command registry ready");

    let responder = Arc::new(ConsoleResponder::stdout());
    let source = StdinSource::spawn(std::io::BufReader::new(std::io::stdin()));
    let mut pipeline = Dispatcher::new(dispatch, registry, responder)
        .context("Invalid dispatch settings")?
        .start(source);

    let signals = tokio::spawn(forward_signals(pipeline.termination_handle()));
    info!("System ready. Waiting for updates...");

    let reason = pipeline.wait_for_termination().await;
    info!(%reason, "Termination requested, draining...");
    signals.abort();

    let report = pipeline.shutdown().await;
    info!(
        state = %report.state,
        executed = report.stats.executed(),
        rejected_full = report.stats.rejected_full,
        "Pipeline shut down"
    );
    if report.worker_panics > 0 {
        warn!(count = report.worker_panics, "Worker tasks panicked during the run");
    }
    Ok(reason)
}

/// Turn the first termination signal into a termination request
async fn forward_signals(termination: TerminationHandle) {
    match wait_for_signal().await {
        Ok(name) => {
            info!(signal = name, "Signal received");
            termination.request(TerminationReason::Signal(name.to_string()));
        }
        Err(e) => error!(error = %e, "Cannot listen for signals"),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut quit = signal(SignalKind::quit())?;

    Ok(tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
        _ = quit.recv() => "SIGQUIT",
    })
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL-C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cli_overrides_persisted_config() {
        let args = Args::parse_from([
            "herald",
            "--root",
            "/tmp/herald",
            "--workers",
            "3",
            "--ttl",
            "1h30m",
            "--log-format",
            "json",
        ]);
        let mut config = Config {
            num_workers: 8,
            num_batches: 2,
            ..Default::default()
        };

        args.apply(&mut config);

        assert_eq!(config.num_workers, 3);
        assert_eq!(config.num_batches, 2);
        assert_eq!(
            config.ttl.map(|t| t.as_duration()),
            Some(Duration::from_secs(90 * 60))
        );
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.root_dir(), PathBuf::from("/tmp/herald"));
    }

    #[test]
    fn test_bad_ttl_is_rejected() {
        assert!(Args::try_parse_from(["herald", "--ttl", "soon"]).is_err());
    }

    #[test]
    fn test_missing_state_starts_from_defaults() {
        let dir = std::env::temp_dir().join(format!("herald-daemon-test-{}", std::process::id()));
        let store = FileStateStore::new(&dir);

        let state = load_state(&store, dir.clone()).unwrap();

        assert_eq!(state.global_config.root, dir);
        assert_eq!(state.global_config.num_workers, 0);
    }
}
