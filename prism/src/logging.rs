//! File logging for the TUI.
//!
//! The terminal belongs to ratatui, so every log line goes to a daily rolling
//! file under the data directory. Filtering follows `PRISM_LOG` (EnvFilter
//! syntax), defaulting to `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Env var holding the log filter directive.
pub const LOG_ENV: &str = "PRISM_LOG";

const LOG_FILE_PREFIX: &str = "prism.log";

/// Directory the rolling log files are written to.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines when dropped; keep it alive for
/// the whole of `main`.
pub fn init(data_dir: &Path) -> std::io::Result<WorkerGuard> {
    let dir = log_dir(data_dir);
    std::fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter);

    // No stdout layer: the TUI owns the terminal.
    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    tracing::info!(dir = %dir.display(), "logging initialised");
    Ok(guard)
}
