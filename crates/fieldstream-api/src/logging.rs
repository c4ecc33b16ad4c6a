//! Logging configuration for fieldstream
//!
//! The library crates emit `tracing` events: `trace` for every stage
//! appended or wrapped, `debug` for terminal execution and close
//! transitions, `warn` for release failures that cannot be returned.
//! [`LogConfig`] installs a subscriber that prints them.

use fieldstream_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILE_NAME: &str = "fieldstream.log";

/// Log output destination
#[derive(Debug, Clone)]
pub enum LogOutput {
    /// Output to stdout
    Stdout,
    /// Output to a daily rolling file
    File(PathBuf),
    /// Output to both stdout and a daily rolling file
    Both(PathBuf),
}

impl LogOutput {
    fn file(&self) -> Option<&Path> {
        match self {
            LogOutput::Stdout => None,
            LogOutput::File(path) | LogOutput::Both(path) => Some(path),
        }
    }

    fn stdout(&self) -> bool {
        !matches!(self, LogOutput::File(_))
    }
}

/// Log format style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format (default)
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level filter, overridden by `RUST_LOG`
    pub level: String,
    /// Output destination
    pub output: LogOutput,
    /// Format style
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: LogOutput::Stdout,
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    /// Info level to stdout
    pub fn info() -> Self {
        Self::default()
    }

    /// Debug level: terminal operations and close transitions
    pub fn debug() -> Self {
        Self::default().with_level("debug")
    }

    /// Trace level: every appended and wrapped stage as well
    pub fn trace() -> Self {
        Self::default().with_level("trace")
    }

    /// Log to a daily rolling file instead of stdout
    pub fn with_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::File(path.into());
        self
    }

    /// Log to stdout and a daily rolling file
    pub fn with_both<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = LogOutput::Both(path.into());
        self
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set log level filter
    pub fn with_level<S: Into<String>>(mut self, level: S) -> Self {
        self.level = level.into();
        self
    }

    /// Installs the global subscriber.
    ///
    /// Returns the file writer's guard when logging to a file; keep it
    /// alive, since dropping it flushes and stops the writer thread.
    /// Fails with `Construction` for an invalid level or when a global
    /// subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use fieldstream::logging::LogConfig;
    ///
    /// let _guard = LogConfig::debug().init()?;
    /// # Ok::<(), fieldstream::Error>(())
    /// ```
    pub fn init(self) -> Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| Error::Construction(format!("invalid log level {:?}: {}", self.level, e)))?;

        let (file_writer, guard) = match self.output.file() {
            Some(path) => {
                let directory = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(DEFAULT_FILE_NAME);
                let appender = tracing_appender::rolling::daily(directory, file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        let stdout = self.output.stdout();
        let pretty = self.format == LogFormat::Pretty;
        let compact_file = file_writer.clone().filter(|_| !pretty);
        let pretty_file = file_writer.filter(|_| pretty);

        tracing_subscriber::registry()
            .with(env_filter)
            .with((stdout && pretty).then(|| fmt::layer().pretty()))
            .with((stdout && !pretty).then(|| fmt::layer().compact()))
            .with(pretty_file.map(|w| fmt::layer().with_writer(w).with_ansi(false).pretty()))
            .with(compact_file.map(|w| fmt::layer().with_writer(w).with_ansi(false).compact()))
            .try_init()
            .map_err(|e| Error::Construction(format!("logging already initialised: {}", e)))?;

        Ok(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(matches!(config.output, LogOutput::Stdout));
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::trace()
            .with_file("/tmp/fieldstream.log")
            .with_format(LogFormat::Compact);
        assert_eq!(config.level, "trace");
        assert!(matches!(config.output, LogOutput::File(_)));
        assert!(!config.output.stdout());
        assert_eq!(config.format, LogFormat::Compact);

        let both = LogConfig::debug().with_both("logs/app.log");
        assert!(both.output.stdout());
        assert_eq!(both.output.file(), Some(Path::new("logs/app.log")));
    }
}
