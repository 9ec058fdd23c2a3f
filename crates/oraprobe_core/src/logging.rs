//! Structured logging setup.
//!
//! Provides:
//! - Daily rotating log files under the data directory
//! - Build-type conditional log levels
//! - Optional mirror to stderr (`ORAPROBE_LOG_CONSOLE=1`)
//! - Environment variable override via ORAPROBE_LOG or RUST_LOG
//!
//! Logs never go to stdout: stdout carries the probe's own output.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Environment variable enabling the stderr mirror.
const CONSOLE_ENV: &str = "ORAPROBE_LOG_CONSOLE";

/// Filter used when file logging is unavailable, so a healthy run stays
/// silent on stderr.
const FALLBACK_FILTER: &str = "error";

/// Logging configuration.
pub struct LogConfig {
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Mirror log lines to stderr
    pub console: bool,
    /// Optional custom log filter
    pub log_filter: Option<String>,
}

impl LogConfig {
    /// Create a new logging configuration.
    pub fn new(log_dir: PathBuf) -> Self {
        let console = std::env::var(CONSOLE_ENV).map(|v| v == "1").unwrap_or(false);
        Self { log_dir, console, log_filter: None }
    }

    /// Set custom log filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Enable or disable the stderr mirror.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }
}

/// Guard that must be held for the lifetime of the process.
///
/// Dropping this guard flushes pending log entries.
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Initialize logging with the given configuration.
///
/// If the file appender cannot be created, falls back to stderr at `error`
/// level (or the explicit filter, when one is set).
pub fn init_logging(config: LogConfig) -> LoggingGuard {
    match init_file_logging(&config) {
        Ok(guard) => LoggingGuard { _worker_guard: Some(guard) },
        Err(e) => {
            let guard = init_stderr_logging(config.log_filter.as_deref());
            tracing::debug!(error = %e, "File logging unavailable, using stderr only");
            guard
        }
    }
}

/// Initialize with defaults (convenience function).
pub fn init_logging_default() -> LoggingGuard {
    init_logging(LogConfig::new(log_dir()))
}

/// Initialize stderr-only logging.
fn init_stderr_logging(filter: Option<&str>) -> LoggingGuard {
    let env_filter = match filter {
        Some(filter) => build_env_filter(Some(filter)),
        None => EnvFilter::try_from_env("ORAPROBE_LOG")
            .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
            .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER)),
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .with_thread_ids(false)
        .try_init();

    LoggingGuard { _worker_guard: None }
}

/// Initialize file logging, optionally mirrored to stderr.
fn init_file_logging(
    config: &LogConfig,
) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("oraprobe")
        .filename_suffix("log")
        .build(&config.log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = build_env_filter(config.log_filter.as_deref());

    if config.console {
        let stderr = std::io::stderr.with_max_level(tracing::Level::INFO);
        tracing_subscriber::fmt()
            .with_writer(stderr.and(non_blocking))
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .try_init()?;
    } else {
        tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .try_init()?;
    }

    Ok(guard)
}

/// Build the environment filter from config or defaults.
fn build_env_filter(custom_filter: Option<&str>) -> EnvFilter {
    // Priority: custom filter > ORAPROBE_LOG > RUST_LOG > default
    if let Some(filter) = custom_filter {
        return EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(default_log_filter()));
    }

    EnvFilter::try_from_env("ORAPROBE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

/// Get the default log filter based on build type.
pub fn default_log_filter() -> &'static str {
    #[cfg(debug_assertions)]
    {
        "debug,oraprobe=trace,oraprobe_core=trace"
    }
    #[cfg(not(debug_assertions))]
    {
        "info,oraprobe=info,oraprobe_core=info"
    }
}

/// Get the default log directory.
pub fn log_dir() -> PathBuf {
    crate::config::default_data_dir().join("logs")
}
