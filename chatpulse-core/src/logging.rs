//! Logging infrastructure for chatpulse
//!
//! Logs are written to `~/.local/state/chatpulse/chatpulse.log.YYYY-MM-DD`
//! following XDG standards, one file per day.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the logging system
///
/// Sets up tracing with:
/// - File output to XDG state directory
/// - Daily rotation, keeping `max_files` files
/// - Configurable log level via config or RUST_LOG env var
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("chatpulse.log")
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // try_init so embedding callers that already set a subscriber keep theirs
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::info!(
        log_file = %current_log_file().display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file prefix
///
/// Files on disk carry a `.YYYY-MM-DD` suffix; see [`current_log_file`].
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

/// The file written today, named the way the daily appender names it.
pub fn current_log_file() -> PathBuf {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    Config::state_dir().join(format!("chatpulse.log.{}", date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path();
        assert!(path.ends_with("chatpulse.log"));
        assert!(path.parent().unwrap().ends_with("chatpulse"));
    }

    #[test]
    fn test_current_log_file_has_date_suffix() {
        let path = current_log_file();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let suffix = name.strip_prefix("chatpulse.log.").unwrap();
        assert!(crate::dates::parse_date(suffix).is_ok(), "{name}");
        assert_eq!(path.parent(), log_file_path().parent());
    }
}
