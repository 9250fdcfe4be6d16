//! Logging setup for the surface host
//
// File logging under the user's data directory, one timestamped folder per
// run, plus colored console output when verbose.
//
// Usage:
//   Call `logging::init(verbose, filter)` at the start of main().
//   Keep the returned guard alive for the program's duration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use directories::ProjectDirs;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::{
    format::{FormatEvent, FormatFields, Writer},
    FmtContext,
};
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE: &str = "host.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine the data directory")]
    NoDataDir,

    #[error("Failed to prepare log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

#[allow(dead_code)]
pub struct LogGuard(tracing_appender::non_blocking::WorkerGuard);

/// `<data dir>/logs`
pub fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "SurfaceHost", "Surface_Host").map(|dirs| dirs.data_dir().join("logs"))
}

/// Create `<logs_dir>/<timestamp>/host.log` and return its path.
pub fn create_log_file_path(logs_dir: &Path) -> Result<PathBuf, LoggingError> {
    let folder = logs_dir.join(Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());
    fs::create_dir_all(&folder)?;
    Ok(folder.join(LOG_FILE))
}

/// Install the global subscriber.
///
/// - `verbose`: also log to stdout with [`GorgeousFormatter`].
/// - `filter`: default directives; `RUST_LOG` overrides them.
pub fn init(verbose: bool, filter: &str) -> Result<LogGuard, LoggingError> {
    let logs_dir = logs_dir().ok_or(LoggingError::NoDataDir)?;
    let log_path = create_log_file_path(&logs_dir)?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    use tracing_subscriber::prelude::*;
    let env_filter = match std::env::var("RUST_LOG").ok() {
        Some(directives) => tracing_subscriber::EnvFilter::new(directives),
        None => tracing_subscriber::EnvFilter::new(filter),
    };
    // File log: plain formatting, no ANSI codes
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);
    let installed = if verbose {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .event_format(GorgeousFormatter);
        registry.with(console_layer).try_init()
    } else {
        registry.try_init()
    };
    installed.map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    tracing::debug!("Logging to {}", log_path.display());
    Ok(LogGuard(guard))
}

/// Colored console formatter. Prints the chain of active spans, so per
/// surface messages show which surface they came from.
pub struct GorgeousFormatter;

impl<S, N> FormatEvent<S, N> for GorgeousFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let (level, color) = match *meta.level() {
            tracing::Level::ERROR => ("ERROR", "\x1b[1;91m"),
            tracing::Level::WARN => ("WARN ", "\x1b[1;93m"),
            tracing::Level::INFO => ("INFO ", "\x1b[1;94m"),
            tracing::Level::DEBUG => ("DEBUG", "\x1b[1;92m"),
            tracing::Level::TRACE => ("TRACE", "\x1b[1;95m"),
        };

        write!(writer, "\x1b[2;36m{}\x1b[0m ", Local::now().format("%H:%M:%S%.3f"))?;
        write!(writer, "{}{}\x1b[0m ", color, level)?;
        write!(writer, "\x1b[4;2;33m{}\x1b[0m", meta.target())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "\x1b[2;35m:{}\x1b[0m", span.name())?;
                let extensions = span.extensions();
                if let Some(fields) =
                    extensions.get::<tracing_subscriber::fmt::FormattedFields<N>>()
                {
                    if !fields.is_empty() {
                        write!(writer, "\x1b[2;35m{{{}}}\x1b[0m", fields)?;
                    }
                }
            }
        }
        write!(writer, ": ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_lands_in_timestamped_folder() {
        let temp_dir = TempDir::new().unwrap();

        let path = create_log_file_path(temp_dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), LOG_FILE);
        let folder = path.parent().unwrap();
        assert!(folder.is_dir());
        assert_eq!(folder.parent().unwrap(), temp_dir.path());
    }
}
