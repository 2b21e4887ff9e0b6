use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directory for log files
const DEFAULT_LOG_DIR: &str = "logs";
/// Log file name prefix
const LOG_FILE: &str = "bespoken.log";

/// Resolve the log directory, honouring `BESPOKEN_LOG_DIR`
pub fn log_dir() -> PathBuf {
    std::env::var("BESPOKEN_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
}

/// Initialize the logging system
/// Logs will be written to the log directory only (no console output),
/// so the chat transcript stays clean.
pub fn init_logging() -> Result<()> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

    // File appender - daily rotation
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Default to INFO level, can be overridden with RUST_LOG env var
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging system initialized");
    tracing::info!("Log files location: {}", dir.join(LOG_FILE).display());

    Ok(())
}
