//! # Logging Utilities
//!
//! Logging infrastructure for the Ferros debugger extensions using `tracing`.
//!
//! Extensions run inside a host debugger, whose console belongs to the user.
//! Log output therefore never goes to stdout: it goes to stderr, or to a file
//! when one is configured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferros_utils::init_logging;
//!
//! // Reads RUST_LOG, FERROS_LOG_FORMAT and FERROS_LOG_FILE
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Initializing");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=ferros_pretty=trace`)
//! - `FERROS_LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `FERROS_LOG_FILE`: write to this file instead of stderr
//!
//! ## Examples
//!
//! ```rust,no_run
//! use ferros_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, io};

use chrono::{NaiveDate, Utc};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Keeps the non-blocking file writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON lines, for collecting logs from automated debugger sessions
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s}. Use 'pretty' or 'json'"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            ))),
        }
    }
}

/// Initialize logging from the environment
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `ferros_pretty=debug`)
/// - `FERROS_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `FERROS_LOG_FILE`: Optional path to log file, replacing stderr
///
/// ## Errors
///
/// Returns an error if:
/// - `FERROS_LOG_FORMAT` names an unknown format
/// - A global subscriber is already installed
/// - The log file directory cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = format_setting(env::var("FERROS_LOG_FORMAT").ok().as_deref())?;

    match env::var("FERROS_LOG_FILE").ok().map(PathBuf::from) {
        Some(path) => init_logging_to_file(&path, None, format),
        None => install(stderr_layer(format, env_filter(None))),
    }
}

/// Initialize stderr logging with explicit level and format
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    install(stderr_layer(format, env_filter(Some(level.into()))))
}

/// Initialize logging to a file only
///
/// `level` overrides `RUST_LOG` when given.
///
/// ## Errors
///
/// Returns an error if the parent directory cannot be created or a global
/// subscriber is already installed.
pub fn init_logging_to_file(path: &Path, level: Option<LogLevel>, format: LogFormat) -> Result<(), LoggingError>
{
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(directory).map_err(LoggingError::FileError)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("not a file path: {}", path.display())))?;

    // The date is part of the name, so the appender never rotates
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = build_layer(format, writer, false, env_filter(level.map(Into::into)));
    install(layer)?;
    // A second successful install is impossible, so the slot is always empty here
    let _ = FILE_GUARD.set(guard);
    Ok(())
}

/// Initialize logging to a dated file inside `directory`
///
/// The file is named `YYYY-MM-DD-ferros-pretty.log`. Returns its path.
///
/// ## Errors
///
/// Same as [`init_logging_to_file`].
pub fn init_logging_in_dir(directory: &Path, level: Option<LogLevel>) -> Result<PathBuf, LoggingError>
{
    let path = directory.join(log_file_name(Utc::now().date_naive()));
    init_logging_to_file(&path, level, LogFormat::Pretty)?;
    Ok(path)
}

/// Dated log file name for `date`.
pub fn log_file_name(date: NaiveDate) -> String
{
    format!("{}-ferros-pretty.log", date.format("%Y-%m-%d"))
}

/// `FERROS_LOG_FORMAT` value, pretty when unset or blank.
fn format_setting(raw: Option<&str>) -> Result<LogFormat, LoggingError>
{
    match raw.map(str::trim) {
        None | Some("") => Ok(LogFormat::Pretty),
        Some(value) => LogFormat::from_str(value),
    }
}

/// Filter priority: explicit level, then `RUST_LOG`, then INFO.
fn env_filter(explicit_level: Option<Level>) -> EnvFilter
{
    if let Some(level) = explicit_level {
        return EnvFilter::new(level.to_string());
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
}

fn stderr_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    build_layer(format, io::stderr, true, filter)
}

fn build_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339());

    match format {
        LogFormat::Pretty => base.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn install(layer: BoxedLayer) -> Result<(), LoggingError>
{
    Registry::default()
        .with(layer)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging (usually: already initialized)
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert!(matches!(LogFormat::from_str("xml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_setting()
    {
        assert_eq!(format_setting(None).unwrap(), LogFormat::Pretty);
        assert_eq!(format_setting(Some("  ")).unwrap(), LogFormat::Pretty);
        assert_eq!(format_setting(Some(" json ")).unwrap(), LogFormat::Json);
        let err = format_setting(Some("xml")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFormat(_)));
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_log_file_name()
    {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(log_file_name(date), "2024-03-09-ferros-pretty.log");
    }

    #[test]
    fn test_second_init_is_an_error()
    {
        // Whichever test installs first wins; the second call must fail cleanly
        let first = init_logging_with_level(LogLevel::Warn, LogFormat::Pretty);
        let second = init_logging_with_level(LogLevel::Warn, LogFormat::Json);
        assert!(first.is_ok() || matches!(first, Err(LoggingError::InitializationFailed(_))));
        assert!(matches!(second, Err(LoggingError::InitializationFailed(_))));
    }
}
