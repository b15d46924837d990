//! Logging infrastructure.
//!
//! Structured `tracing` output to two sinks:
//! - `<log_dir>/geoanchor.log`, cleared at session start
//! - stderr, so stdout stays free for JSON status output
//!
//! Filter with the `RUST_LOG` environment variable (default `info`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files, created if missing
/// * `log_file` - Log file name inside `log_dir`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the previous log
/// file cannot be cleared.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create `log_dir` and truncate `log_file` inside it.
///
/// Returns the full path of the log file.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;
    Ok(log_path)
}

/// Default log directory (~/.geoanchor/logs).
pub fn default_log_dir() -> PathBuf {
    crate::config::config_directory().join("logs")
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "geoanchor.log"
}
