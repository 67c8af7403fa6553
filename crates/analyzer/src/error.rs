//! Error and warning types for the analyzer
//!
//! Two different kinds of failure live here:
//!
//! - [`AnalyzerError`] covers the operational surface (loading configuration,
//!   installing a log subscriber, serializing results). These are returned as `Err`.
//! - [`Warning`] describes malformed protocol input. Malformed input is never an
//!   `Err`: the parser records a warning against the offending byte span and
//!   carries on with the next header or line.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// A type alias for handling `Result`s with `AnalyzerError`
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors raised by the analyzer's operational surface
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// Unknown log level name
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Log subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Serialization of analysis results failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Kinds of malformed-input condition reported while dissecting a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A header line has no `:` separating name and value
    HeaderNoColon,
    /// The header name is neither a known header nor a configured custom header
    UnrecognizedHeader,
    /// The header block ended at the end of the buffer without an empty line
    HeaderNotTerminated,
    /// A URI in an address header could not be delimited
    MalformedUri,
    /// CSeq lacks a number or a method token
    MalformedCSeq,
    /// CSeq method exceeds the configured maximum length
    CSeqMethodTooLong,
    /// RAck lacks one of its three parts
    MalformedRAck,
    /// A numeric header carried a non-numeric value
    MalformedInteger,
    /// A Via sent-by has a `:` with no port digits
    MalformedViaPort,
    /// An authentication parameter has no `=`
    MalformedAuthParameter,
    /// A security mechanism numeric parameter has no value
    MalformedSecurityParameter,
    /// Content-Length declares more bytes than the buffer holds
    ContentLengthMismatch,
}

impl WarningKind {
    /// Human readable summary
    pub fn description(&self) -> &'static str {
        match self {
            WarningKind::HeaderNoColon => "Header has no colon after the name",
            WarningKind::UnrecognizedHeader => "Unrecognised SIP header",
            WarningKind::HeaderNotTerminated => "Header not terminated by empty line (CRLF)",
            WarningKind::MalformedUri => "Malformed URI",
            WarningKind::MalformedCSeq => "Malformed CSeq",
            WarningKind::CSeqMethodTooLong => "CSeq method too long",
            WarningKind::MalformedRAck => "Malformed RAck",
            WarningKind::MalformedInteger => "Expected an unsigned integer value",
            WarningKind::MalformedViaPort => "Via sent-by has a colon but no port",
            WarningKind::MalformedAuthParameter => "Authentication parameter without value",
            WarningKind::MalformedSecurityParameter => "Security mechanism parameter without value",
            WarningKind::ContentLengthMismatch => "Content-Length exceeds the available bytes",
        }
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A malformed-input condition tied to a byte span of the message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub span: Range<usize>,
}

impl Warning {
    pub fn new(kind: WarningKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}
