//! Logging setup
//!
//! `RUST_LOG` selects levels (default `herald=info`), `HERALD_LOG_FORMAT` or
//! `--log-format` selects the output:
//!
//! ```text
//! HERALD_LOG_FORMAT=json RUST_LOG=herald_core=debug ./herald
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "herald=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Development: human-readable, multi-line
    Pretty,
    /// Production: one JSON object per line
    Json,
}

/// Install the global subscriber. Logs go to stderr (stdout carries replies)
/// through a non-blocking writer; keep the guard alive until exit so the
/// buffered lines get flushed.
pub fn init(format: LogFormat) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("Failed to create env filter")?;
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
