//! Diagnostic logging setup.
//!
//! Failed chat requests are only ever reported here, so the interactive page
//! sends the log to a file (the terminal belongs to the UI). One-shot
//! commands log to stderr.
//!
//! The filter comes from `MENTOR_LOG`, then `RUST_LOG`, then [`DEFAULT_LEVEL`].

use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding the log filter.
pub const ENV_LOG: &str = "MENTOR_LOG";

/// Filter used when no environment variable is set.
pub const DEFAULT_LEVEL: &str = "info";

/// Where diagnostics go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Human-readable lines on stderr.
    Stderr,
    /// Appended to a file; parent directories are created.
    File(PathBuf),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber.
///
/// For [`LogTarget::File`] the returned guard flushes the background writer
/// when dropped; keep it alive for the life of the program.
pub fn init_logging(target: &LogTarget) -> Result<Option<WorkerGuard>, LoggingError> {
    let registry = Registry::default().with(env_filter());

    match target {
        LogTarget::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);
            registry.with(layer).try_init()?;
            Ok(None)
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(LoggingError::Io)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(LoggingError::Io)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            registry.with(layer).try_init()?;
            Ok(Some(guard))
        }
    }
}

/// Errors installing the logger.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// A global subscriber was already installed.
    #[error("Logger already initialized: {0}")]
    AlreadySet(#[from] tracing_subscriber::util::TryInitError),
}
