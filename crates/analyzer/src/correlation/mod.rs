//! Transaction correlation
//!
//! Messages are grouped by [`TransactionKey`] (Call-ID plus both endpoints,
//! per direction). The store detects retransmitted requests and final
//! responses, pairs responses with their request through the reverse key,
//! and pairs an ACK with its INVITE through the same-direction key.
//!
//! Correlation is limited to UDP. Stream transports retransmit below SIP,
//! and SCTP is left out as well.

pub mod key;
pub mod store;

pub use key::{TransactionKey, CANONICAL_SOURCE_PORT};
pub use store::{CorrelationInput, CorrelationStore, PerFrameResult, TransactionEntry, TransactionState};
