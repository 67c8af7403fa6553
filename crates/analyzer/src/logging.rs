//! Diagnostics output for analysis runs
//!
//! The analyzer reports through `tracing`: per-header detail at `trace`,
//! dissection and correlation outcomes at `debug`, malformed input at `warn`.
//! Embedders install their own subscriber; [`setup_logging`] is the one the
//! command line tool uses. Diagnostics go to stderr so they never mix with
//! the analysis written to stdout.

use crate::error::{AnalyzerError, Result};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

/// Line format of the diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Lowest level emitted unless `RUST_LOG` says otherwise
    pub level: Level,
    pub format: LogFormat,
    /// Source file and line of each event
    pub file_info: bool,
    /// Emit span enter/exit events
    pub span_events: bool,
    /// Reported once when the subscriber is installed
    pub component: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(Level::WARN, "sipscope")
    }
}

impl LoggingConfig {
    pub fn new(level: Level, component: impl Into<String>) -> Self {
        Self {
            level,
            format: LogFormat::Text,
            file_info: false,
            span_events: false,
            component: component.into(),
        }
    }

    pub fn with_json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::from_default_env().add_directive(self.level.into())
    }
}

/// Install the process-wide subscriber.
///
/// Fails if one is already installed, which happens when a test harness or
/// an embedding application got there first.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(config.filter())
        .with_span_events(if config.span_events {
            FmtSpan::ACTIVE
        } else {
            FmtSpan::NONE
        })
        .with_writer(std::io::stderr)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| AnalyzerError::Logging(e.to_string()))?;

    tracing::debug!(component = %config.component, format = ?config.format, "diagnostics enabled");
    Ok(())
}

/// Level named on the command line or in the environment, case-insensitive
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| AnalyzerError::InvalidLogLevel(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level(" WARN ").unwrap(), Level::WARN);
        assert!(matches!(
            parse_log_level("chatty"),
            Err(AnalyzerError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_builder_flags() {
        let config = LoggingConfig::new(Level::TRACE, "replay")
            .with_json()
            .with_file_info();
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file_info);
        assert!(!config.span_events);
        assert_eq!(config.component, "replay");
        assert_eq!(LoggingConfig::default().level, Level::WARN);
    }
}
