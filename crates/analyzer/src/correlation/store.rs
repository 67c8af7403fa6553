use super::key::TransactionKey;
use crate::config::AnalyzerConfig;
use crate::message::SipMessage;
use crate::types::{FrameId, FrameInfo, MessageRef, Method, Transport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Progress of the transaction stored under one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    NothingSeen,
    RequestSeen,
    ProvisionalResponseSeen,
    FinalResponseSeen,
}

/// Stored state for one [`TransactionKey`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub cseq: u32,
    pub method: Method,
    pub state: TransactionState,
    /// Frame that established the current state (original request or final response)
    pub frame: Option<FrameId>,
    pub request_time: Option<DateTime<Utc>>,
    pub response_code: Option<u16>,
}

impl TransactionEntry {
    fn new(cseq: u32, method: &Method) -> Self {
        Self {
            cseq,
            method: method.clone(),
            state: TransactionState::NothingSeen,
            frame: None,
            request_time: None,
            response_code: None,
        }
    }
}

/// Correlation outcome for one message, memoised by [`MessageRef`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerFrameResult {
    /// The message repeats the request or final response first seen in this frame
    pub original_frame_of_resend: Option<FrameId>,
    /// For responses the request frame; for ACK the INVITE frame
    pub matching_request_frame: Option<FrameId>,
    pub response_time_ms: Option<i64>,
    /// ACK only: time from the INVITE to this ACK
    pub setup_time_ms: Option<i64>,
    /// Responses to BYE: same as the response time
    pub release_time_ms: Option<i64>,
}

impl PerFrameResult {
    pub fn is_resend(&self) -> bool {
        self.original_frame_of_resend.is_some()
    }
}

/// The fields of a message the correlator looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationInput<'a> {
    pub call_id: &'a str,
    pub cseq: u32,
    /// Method named in CSeq
    pub method: &'a Method,
    /// `None` for requests
    pub status_code: Option<u16>,
}

impl<'a> CorrelationInput<'a> {
    /// `None` when the message has no usable CSeq
    pub fn from_message(message: &'a SipMessage) -> Option<Self> {
        let cseq = message.cseq.as_ref()?;
        Some(Self {
            call_id: message.call_id.as_deref().unwrap_or_default(),
            cseq: cseq.number,
            method: &cseq.method,
            status_code: message.status_code(),
        })
    }

    pub fn is_request(&self) -> bool {
        self.status_code.is_none()
    }
}

/// Keyed transaction store plus the per-message memo.
///
/// The store is mutated only the first time a message is correlated. Later
/// passes over the same message read the memo and leave the store alone.
#[derive(Debug, Clone)]
pub struct CorrelationStore {
    max_call_id_len: usize,
    retrans_same_source_port: bool,
    entries: HashMap<TransactionKey, TransactionEntry>,
    results: HashMap<MessageRef, PerFrameResult>,
}

impl Default for CorrelationStore {
    fn default() -> Self {
        Self::new(&AnalyzerConfig::default())
    }
}

/// Milliseconds from `earlier` to `later`, rounded
fn elapsed_ms(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => (us as f64 / 1000.0).round() as i64,
        None => delta.num_milliseconds(),
    }
}

impl CorrelationStore {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            max_call_id_len: config.max_call_id_len,
            retrans_same_source_port: config.retrans_same_source_port,
            entries: HashMap::new(),
            results: HashMap::new(),
        }
    }

    /// Correlate one message and memoise the result.
    ///
    /// Only UDP messages outside error indications take part. A message
    /// already correlated, or a revisited frame, gets the memoised result
    /// without touching the store.
    pub fn correlate(&mut self, frame: &FrameInfo, index: u16, input: &CorrelationInput<'_>) -> PerFrameResult {
        if frame.transport != Transport::Udp || frame.in_error_packet {
            return PerFrameResult::default();
        }

        let message_ref = MessageRef::new(frame.id, index);
        if let Some(result) = self.results.get(&message_ref) {
            return result.clone();
        }
        if frame.visited {
            return PerFrameResult::default();
        }

        let mut result = PerFrameResult::default();

        if input.is_request() && *input.method == Method::Ack {
            if let Some((invite_frame, setup_time)) = self.find_invite(frame, input) {
                result.matching_request_frame = Some(invite_frame);
                result.setup_time_ms = Some(setup_time);
            }
        }

        result.original_frame_of_resend = self.check_resend(frame, input);

        if !input.is_request() {
            if let Some((request_frame, response_time)) = self.find_request(frame, input) {
                result.matching_request_frame = Some(request_frame);
                result.response_time_ms = response_time;
                if *input.method == Method::Bye {
                    result.release_time_ms = response_time;
                }
            }
        }

        debug!(
            frame = %frame.id,
            index,
            call_id = input.call_id,
            cseq = input.cseq,
            resend_of = ?result.original_frame_of_resend,
            request = ?result.matching_request_frame,
            "correlated message"
        );
        self.results.insert(message_ref, result.clone());
        result
    }

    fn key_for(&self, frame: &FrameInfo, call_id: &str) -> TransactionKey {
        TransactionKey::new(call_id, frame.source, frame.destination, self.max_call_id_len)
    }

    /// Fold the source port when resends may change it
    fn stored_key(&self, key: TransactionKey) -> TransactionKey {
        if self.retrans_same_source_port {
            key
        } else {
            key.with_canonical_source_port()
        }
    }

    /// Update the same-direction entry and report the frame this message
    /// repeats, if it is a resend
    pub fn check_resend(&mut self, frame: &FrameInfo, input: &CorrelationInput<'_>) -> Option<FrameId> {
        let key = self.stored_key(self.key_for(frame, input.call_id));
        let is_request = input.is_request();

        let (entry, cseq_to_compare) = match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                let previous = entry.cseq;
                if entry.cseq != input.cseq {
                    *entry = TransactionEntry::new(input.cseq, input.method);
                    if is_request {
                        entry.request_time = Some(frame.timestamp);
                    }
                }
                (entry, Some(previous))
            }
            Entry::Vacant(vacant) => {
                let mut entry = TransactionEntry::new(input.cseq, input.method);
                if is_request {
                    entry.request_time = Some(frame.timestamp);
                }
                (vacant.insert(entry), None)
            }
        };

        let same_cseq = cseq_to_compare == Some(input.cseq) && entry.method == *input.method;
        let resend = match input.status_code {
            None => {
                same_cseq
                    && entry.state == TransactionState::RequestSeen
                    && !matches!(input.method, Method::Ack | Method::Cancel)
            }
            Some(code) => {
                same_cseq
                    && entry.state == TransactionState::FinalResponseSeen
                    && code >= 200
                    && entry.response_code == Some(code)
            }
        };
        let original = if resend { entry.frame } else { None };

        match input.status_code {
            None => {
                entry.state = TransactionState::RequestSeen;
                if original.is_none() {
                    entry.frame = Some(frame.id);
                }
            }
            Some(code) if code >= 200 => {
                entry.response_code = Some(code);
                entry.state = TransactionState::FinalResponseSeen;
                if original.is_none() {
                    entry.frame = Some(frame.id);
                }
            }
            Some(_) => entry.state = TransactionState::ProvisionalResponseSeen,
        }

        if let Some(original) = original {
            debug!(frame = %frame.id, original = %original, "resend detected");
        }
        original
    }

    /// Find the request a response answers, through the reverse-direction
    /// entry. Returns the request frame and, when the request time is known,
    /// the response time.
    pub fn find_request(&self, frame: &FrameInfo, input: &CorrelationInput<'_>) -> Option<(FrameId, Option<i64>)> {
        let key = self.stored_key(self.key_for(frame, input.call_id).reversed());
        let entry = self.entries.get(&key)?;
        if entry.cseq != input.cseq
            || entry.state != TransactionState::RequestSeen
            || entry.method != *input.method
        {
            return None;
        }
        let request_frame = entry.frame?;
        let response_time = entry
            .request_time
            .map(|sent| elapsed_ms(sent, frame.timestamp));
        Some((request_frame, response_time))
    }

    /// Find the INVITE an ACK belongs to, through the same-direction entry.
    /// Returns the INVITE frame and the setup time.
    pub fn find_invite(&self, frame: &FrameInfo, input: &CorrelationInput<'_>) -> Option<(FrameId, i64)> {
        let key = self.stored_key(self.key_for(frame, input.call_id));
        let entry = self.entries.get(&key)?;
        let invite_frame = entry.frame?;
        let sent = entry.request_time?;
        Some((invite_frame, elapsed_ms(sent, frame.timestamp)))
    }

    /// Stored state for the direction `frame` travels in
    pub fn entry(&self, frame: &FrameInfo, call_id: &str) -> Option<&TransactionEntry> {
        self.entries.get(&self.stored_key(self.key_for(frame, call_id)))
    }

    /// Memoised result of one message
    pub fn result(&self, message: MessageRef) -> Option<&PerFrameResult> {
        self.results.get(&message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every transaction and memoised result, as when a capture is reloaded
    pub fn reset(&mut self) {
        debug!(entries = self.entries.len(), results = self.results.len(), "resetting correlation store");
        self.entries.clear();
        self.results.clear();
    }
}
