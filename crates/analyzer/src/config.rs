//! Analyzer configuration
//!
//! [`AnalyzerConfig`] groups every tunable of the dissector and the correlator.
//! It can be built in code with the `with_*` methods or loaded from TOML:
//!
//! ```rust
//! use sipscope_analyzer::config::AnalyzerConfig;
//!
//! let config = AnalyzerConfig::from_toml_str(r#"
//!     strict_sip_version = false
//!     custom_headers = ["X-Trace-Id"]
//! "#).unwrap();
//! assert!(!config.strict_sip_version);
//! assert!(config.is_custom_header("x-trace-id"));
//! ```

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound applied to Call-ID when building a transaction key
pub const DEFAULT_MAX_CALL_ID_LEN: usize = 128;

/// Default bound for a CSeq method token
pub const DEFAULT_MAX_CSEQ_METHOD_LEN: usize = 16;

/// Configuration for message dissection and transaction correlation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Require the version token to be exactly `SIP/2.0`.
    /// When disabled any case-insensitive `SIP/` prefix is accepted.
    pub strict_sip_version: bool,

    /// Keep the real source port in the retransmission key.
    /// When disabled all source ports fold into one canonical value so
    /// retransmissions sent from a different port still match.
    pub retrans_same_source_port: bool,

    /// On TCP, ask for more data until the header block is complete
    pub desegment_headers: bool,

    /// On TCP, ask for more data until the Content-Length body is complete
    pub desegment_body: bool,

    /// Extra header names treated as known opaque headers
    pub custom_headers: Vec<String>,

    /// Maximum Call-ID length used in the transaction key
    pub max_call_id_len: usize,

    /// Maximum CSeq method length
    pub max_cseq_method_len: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            strict_sip_version: true,
            retrans_same_source_port: true,
            desegment_headers: true,
            desegment_body: true,
            custom_headers: Vec::new(),
            max_call_id_len: DEFAULT_MAX_CALL_ID_LEN,
            max_cseq_method_len: DEFAULT_MAX_CSEQ_METHOD_LEN,
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalyzerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_strict_sip_version(mut self, strict: bool) -> Self {
        self.strict_sip_version = strict;
        self
    }

    pub fn with_retrans_same_source_port(mut self, same_port: bool) -> Self {
        self.retrans_same_source_port = same_port;
        self
    }

    pub fn with_desegmentation(mut self, headers: bool, body: bool) -> Self {
        self.desegment_headers = headers;
        self.desegment_body = body;
        self
    }

    /// Register an additional custom header name
    pub fn with_custom_header(mut self, name: impl Into<String>) -> Self {
        self.custom_headers.push(name.into());
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_call_id_len == 0 {
            return Err(AnalyzerError::config("max_call_id_len must be greater than zero"));
        }
        if self.max_cseq_method_len == 0 {
            return Err(AnalyzerError::config(
                "max_cseq_method_len must be greater than zero",
            ));
        }
        if let Some(empty) = self.custom_headers.iter().find(|h| h.trim().is_empty()) {
            return Err(AnalyzerError::config(format!(
                "custom header name must not be blank: {:?}",
                empty
            )));
        }
        Ok(())
    }

    /// Whether `name` (already lowercased) matches a configured custom header
    pub fn is_custom_header(&self, name: &str) -> bool {
        self.custom_headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}
