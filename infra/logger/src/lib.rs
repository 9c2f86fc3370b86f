//! # Logger
//!
//! Logging setup shared by the workspace tooling.
//!
//! Console output is written to `stderr` so that command output on `stdout`
//! (reports, rendered files, JSON) stays machine readable. An optional log
//! directory adds a non-blocking rolling file layer, which is useful for
//! keeping an audit trail of publish runs.
//!
//! `RUST_LOG` always wins over the programmatic level; use
//! [`LoggerBuilder::env_filter`] for module-directed defaults
//! (e.g., `"mple_release=debug"`).
//!
//! ## Example
//!
//! ```rust
//! # use mple_logger::{LevelFilter, Logger};
//! let _logger = Logger::builder("xtask")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt, Result};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

/// Output encoding for every enabled layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human readable events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Configures and installs the global tracing subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    format: LogFormat,
    console: bool,
    directory: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
    env_filter: Option<String>,
}

impl LoggerBuilder {
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Derives the level from `-v`/`-q` style flags, see [`level_for_verbosity`].
    #[must_use]
    pub const fn verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        self.level = level_for_verbosity(verbose, quiet);
        self
    }

    #[must_use]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enables or disables the `stderr` layer.
    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Writes log files named `<name>.<date>.log` into `directory`.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Programmatic filter directives. `RUST_LOG` still overrides them.
    #[must_use]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Installs the subscriber for the whole process.
    ///
    /// The returned [`Logger`] owns the file writer guard; keep it alive until
    /// shutdown or buffered file events are lost.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`,
    ///   a malformed filter or when no layer is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] when the log directory is unusable.
    /// * [`LoggerError::Subscriber`] when a global subscriber is already set.
    pub fn init(self) -> Result<Logger> {
        self.validate()?;
        let filter = self.build_filter()?;

        let mut layers = Vec::new();

        if self.console {
            let ansi = std::io::stderr().is_terminal();
            let console = layer().with_writer(std::io::stderr).with_target(false);
            layers.push(match self.format {
                LogFormat::Compact => console.compact().with_ansi(ansi).boxed(),
                LogFormat::Json => console.json().with_ansi(false).boxed(),
            });
        }

        let guard = match &self.directory {
            Some(directory) => {
                fs::create_dir_all(directory).context(format!(
                    "Failed to create log directory: {}",
                    directory.display()
                ))?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.rotation.clone())
                    .filename_prefix(&self.name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.max_files)
                    .build(directory)?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file = layer().with_writer(writer).with_ansi(false);
                layers.push(match self.format {
                    LogFormat::Compact => file.boxed(),
                    LogFormat::Json => file.json().boxed(),
                });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn build_filter(&self) -> Result<EnvFilter> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        let Some(directives) = &self.env_filter else {
            return Ok(builder.from_env_lossy());
        };

        let mut filter = builder.parse(directives).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{directives}': {e}").into(),
                context: None,
            }
        })?;

        // RUST_LOG directives are appended last so they take precedence.
        if let Ok(from_env) = std::env::var(EnvFilter::DEFAULT_ENV) {
            for directive in from_env.split(',').filter(|d| !d.trim().is_empty()) {
                if let Ok(directive) = directive.trim().parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }
        Ok(filter)
    }
}

/// Handle to the installed subscriber.
#[must_use = "Dropping this handle stops the background file writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring a subscriber. `name` prefixes rolling log files.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
            console: true,
            directory: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            env_filter: None,
        }
    }

    /// Returns `true` when events are also written to a log file.
    #[must_use]
    pub const fn writes_file(&self) -> bool {
        self.guard.is_some()
    }
}

/// Maps CLI verbosity flags to a level.
///
/// `quiet` wins over any number of `-v` flags and only keeps errors.
/// No flags means `INFO`, `-v` is `DEBUG`, `-vv` and beyond is `TRACE`.
#[must_use]
pub const fn level_for_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
