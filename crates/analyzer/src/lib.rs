//! # sipscope-analyzer: SIP message analysis and transaction correlation
//!
//! This library takes bytes captured from a network link, decides whether
//! they hold a SIP request or response, tokenizes the start line, headers and
//! URIs, and correlates each message with earlier traffic of the same call.
//!
//! ## Features
//!
//! - **Byte-offset provenance**: every parsed element carries its absolute
//!   range in the captured buffer
//! - **Full header table**: full and compact header names, plus configured
//!   custom headers
//! - **Warnings as data**: malformed headers are reported and skipped, never
//!   an `Err`
//! - **Correlation**: resend detection, response matching, response, setup
//!   and release times
//! - **Multi-pass safe**: revisiting a frame reads the memoised result and
//!   leaves the store untouched
//! - **Stream aware**: TCP segments with several messages, and need-more-data
//!   outcomes for incomplete ones
//!
//! ## Usage
//!
//! ```rust
//! use sipscope_analyzer::{Analyzer, AnalyzerConfig, FrameInfo, Transport};
//! use chrono::Utc;
//!
//! let mut analyzer = Analyzer::new(AnalyzerConfig::default());
//! let frame = FrameInfo::new(
//!     1,
//!     Transport::Udp,
//!     "192.0.2.1:5060".parse()?,
//!     "192.0.2.2:5060".parse()?,
//!     Utc::now(),
//! );
//! let bytes = b"OPTIONS sip:bob@example.com SIP/2.0\r\nCall-ID: 1@a\r\nCSeq: 1 OPTIONS\r\n\r\n";
//!
//! let analysis = analyzer.analyze(&frame, bytes, bytes.len());
//! assert_eq!(analysis.messages.len(), 1);
//! assert!(analysis.messages[0].message.is_request());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod correlation;
pub mod error;
pub mod logging;
pub mod message;
pub mod parser;
pub mod registration;
pub mod stats;
pub mod types;

pub use analyzer::{Analysis, Analyzer, MessageAnalysis};
pub use config::AnalyzerConfig;
pub use correlation::{CorrelationStore, PerFrameResult, TransactionKey};
pub use error::{AnalyzerError, Result, Warning, WarningKind};
pub use logging::{parse_log_level, setup_logging, LogFormat, LoggingConfig};
pub use message::{dissect, Dissection, SipMessage};
pub use registration::{summarize_registration, RegistrationSummary};
pub use stats::{SipStats, SipSummary, StatRow};
pub use types::{FrameId, FrameInfo, HeaderKind, HeaderName, HeaderValue, Method, MessageRef, Transport};

/// Version information for the analyzer library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
