//! Tracing subscriber setup
//!
//! Library code only ever emits events (targets `anygen::http`,
//! `anygen::poll`, `anygen::models`); installing a subscriber is the
//! caller's choice. This module offers an opt-in, env-configurable setup
//! for binaries that do not bring their own.
//!
//! ## Example
//!
//! ```rust,no_run
//! use anygen::telemetry::{self, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = telemetry::init_subscriber(config).unwrap();
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;

use crate::error::GenError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format
    Json,
    /// Compact JSON format
    JsonCompact,
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Log level
    pub log_level: tracing::Level,
    /// Output format
    pub output_format: OutputFormat,
    /// Log file path; when set, output goes to this file through a
    /// non-blocking appender instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    /// Create a new builder for `SubscriberConfig`.
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// A debugging configuration.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// A production configuration: warnings and up, JSON, to a file.
    pub fn production(log_file: PathBuf) -> Self {
        Self {
            log_level: tracing::Level::WARN,
            output_format: OutputFormat::Json,
            log_file: Some(log_file),
        }
    }
}

/// Builder for [`SubscriberConfig`]
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    /// Set the log level.
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string.
    pub fn log_level_str(mut self, level: &str) -> Result<Self, GenError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(GenError::ConfigurationError(format!(
                    "invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    level
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    /// Set the output format.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set the log file path.
    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Returns the appender's worker guard when file logging is enabled; the
/// guard must be kept alive for the duration of the program or buffered
/// lines are lost. An already-installed global subscriber is tolerated
/// and leaves the existing one in place.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, GenError> {
    let filter = format!("anygen={}", level_str(config.log_level));

    let (init_result, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer);
            let result = match config.output_format {
                OutputFormat::Json => builder.json().try_init(),
                OutputFormat::JsonCompact => builder.json().compact().try_init(),
                OutputFormat::Text => builder.try_init(),
            };
            (result, Some(guard))
        }
        None => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true);
            let result = match config.output_format {
                OutputFormat::Json => builder.json().try_init(),
                OutputFormat::JsonCompact => builder.json().compact().try_init(),
                OutputFormat::Text => builder.try_init(),
            };
            (result, None)
        }
    };

    match init_result {
        Ok(()) => Ok(guard),
        Err(e) if e.to_string().contains("has already been set") => Ok(None),
        Err(e) => Err(GenError::ConfigurationError(format!(
            "failed to initialize tracing: {}",
            e
        ))),
    }
}

/// Initialize with the default configuration.
pub fn init_default() -> Result<Option<WorkerGuard>, GenError> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialize for debugging.
pub fn init_debug() -> Result<Option<WorkerGuard>, GenError> {
    init_subscriber(SubscriberConfig::debug())
}

/// Initialize for production with a log file.
pub fn init_production(log_file: PathBuf) -> Result<Option<WorkerGuard>, GenError> {
    init_subscriber(SubscriberConfig::production(log_file))
}

/// Initialize from environment variables.
///
/// - `ANYGEN_LOG_LEVEL`: trace, debug, info, warn, error
/// - `ANYGEN_LOG_FORMAT`: text, json, json-compact
/// - `ANYGEN_LOG_FILE`: log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, GenError> {
    let mut builder = SubscriberConfig::builder();

    if let Ok(level) = std::env::var("ANYGEN_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }

    if let Ok(format) = std::env::var("ANYGEN_LOG_FORMAT") {
        let output_format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "json-compact" => OutputFormat::JsonCompact,
            "text" => OutputFormat::Text,
            _ => {
                return Err(GenError::ConfigurationError(format!(
                    "invalid log format: {}. Valid options: text, json, json-compact",
                    format
                )));
            }
        };
        builder = builder.output_format(output_format);
    }

    if let Ok(file_path) = std::env::var("ANYGEN_LOG_FILE") {
        builder = builder.log_file(PathBuf::from(file_path));
    }

    init_subscriber(builder.build())
}

fn level_str(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}

fn file_writer(
    path: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), GenError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        GenError::ConfigurationError(format!("log file path has no file name: {}", path.display()))
    })?;
    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
