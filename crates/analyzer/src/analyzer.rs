//! Analysis session
//!
//! An [`Analyzer`] owns the configuration, the transaction store and the
//! statistics of one capture session. Independent captures need independent
//! analyzers; nothing is shared between them.

use crate::config::AnalyzerConfig;
use crate::correlation::{CorrelationInput, CorrelationStore, PerFrameResult};
use crate::error::Result;
use crate::message::{dissect, Dissection, SipMessage};
use crate::registration::{summarize_registration, RegistrationSummary};
use crate::stats::{SipStats, SipSummary};
use crate::types::{FrameId, FrameInfo, Transport};
use serde::Serialize;
use tracing::debug;

/// Everything learned about one message of a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageAnalysis {
    /// Position of the message within its frame
    pub index: u16,
    pub message: SipMessage,
    /// `None` when the message did not take part in correlation
    pub correlation: Option<PerFrameResult>,
    pub registration: Option<RegistrationSummary>,
    /// Not produced for messages inside error indications
    pub summary: Option<SipSummary>,
}

/// Result of analysing one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub frame: FrameId,
    pub messages: Vec<MessageAnalysis>,
    /// Bytes of the buffer accounted for by messages or continuation data
    pub consumed: usize,
    /// Set when the stream must be extended; the value is the offset where
    /// the incomplete message starts
    pub need_more_data: Option<usize>,
    /// The buffer does not start with a SIP message
    pub not_sip: bool,
}

impl Analysis {
    fn new(frame: FrameId) -> Self {
        Self {
            frame,
            messages: Vec::new(),
            consumed: 0,
            need_more_data: None,
            not_sip: false,
        }
    }

    pub fn is_sip(&self) -> bool {
        !self.not_sip
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Dissects frames, correlates their messages and feeds the statistics sink
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    store: CorrelationStore,
    stats: SipStats,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let store = CorrelationStore::new(&config);
        Self {
            config,
            store,
            stats: SipStats::new(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn store(&self) -> &CorrelationStore {
        &self.store
    }

    pub fn stats(&self) -> &SipStats {
        &self.stats
    }

    /// Analyse one captured frame.
    ///
    /// Only the first `reported_len` bytes are looked at; a truncated capture
    /// may hand over fewer bytes than that.
    pub fn analyze(&mut self, frame: &FrameInfo, bytes: &[u8], reported_len: usize) -> Analysis {
        let buf = &bytes[..reported_len.min(bytes.len())];
        match frame.transport {
            Transport::Udp | Transport::Sctp => self.analyze_datagram(frame, buf),
            Transport::Tcp | Transport::Tls => self.analyze_segment(frame, buf),
        }
    }

    /// A datagram carries exactly one message
    fn analyze_datagram(&mut self, frame: &FrameInfo, buf: &[u8]) -> Analysis {
        let mut analysis = Analysis::new(frame.id);
        match dissect(buf, 0, frame.transport, &self.config, false) {
            Dissection::Message(message) => {
                analysis.consumed = buf.len();
                let result = self.record(frame, 0, buf, *message);
                analysis.messages.push(result);
            }
            Dissection::NeedMoreData { consumed } => analysis.need_more_data = Some(consumed),
            Dissection::Continuation { consumed } => analysis.consumed = consumed,
            Dissection::NotSip => analysis.not_sip = true,
        }
        analysis
    }

    /// Walk every message of a stream segment.
    ///
    /// Only the first message must start the buffer; text after a complete
    /// message that is not SIP is taken as continuation data. Stops at the
    /// first need-more-data outcome.
    pub fn analyze_segment(&mut self, frame: &FrameInfo, buf: &[u8]) -> Analysis {
        let mut analysis = Analysis::new(frame.id);
        let mut offset = 0;
        let mut index: u16 = 0;

        while offset < buf.len() {
            let first = analysis.messages.is_empty();
            match dissect(buf, offset, frame.transport, &self.config, !first) {
                Dissection::Message(message) => {
                    let end = message.end();
                    let result = self.record(frame, index, buf, *message);
                    analysis.messages.push(result);
                    index = index.saturating_add(1);
                    if end <= offset {
                        break;
                    }
                    offset = end;
                }
                Dissection::Continuation { consumed } => {
                    offset = consumed;
                    break;
                }
                Dissection::NeedMoreData { consumed } => {
                    debug!(frame = %frame.id, offset = consumed, "segment needs more data");
                    analysis.need_more_data = Some(consumed);
                    break;
                }
                Dissection::NotSip => {
                    analysis.not_sip = first;
                    break;
                }
            }
        }

        analysis.consumed = offset;
        analysis
    }

    fn record(&mut self, frame: &FrameInfo, index: u16, buf: &[u8], message: SipMessage) -> MessageAnalysis {
        let correlation = CorrelationInput::from_message(&message)
            .map(|input| self.store.correlate(frame, index, &input));

        let summary = if frame.in_error_packet {
            None
        } else {
            let result = correlation.clone().unwrap_or_default();
            let summary = SipSummary::new(frame.id, index, buf, &message, &result);
            if !frame.visited {
                self.stats.record(&summary);
            }
            Some(summary)
        };

        MessageAnalysis {
            index,
            registration: summarize_registration(&message),
            message,
            correlation,
            summary,
        }
    }

    /// Forget every transaction, memoised result and counter, as when the
    /// capture is reloaded
    pub fn reset(&mut self) {
        self.store.reset();
        self.stats = SipStats::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;
    use chrono::{TimeZone, Utc};

    fn frame(id: u64, transport: Transport) -> FrameInfo {
        FrameInfo::new(
            id,
            transport,
            "10.0.0.1:5060".parse().unwrap(),
            "10.0.0.2:5060".parse().unwrap(),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    const OPTIONS: &[u8] = b"OPTIONS sip:carol@chicago.com SIP/2.0\r\nCall-ID: opt1\r\nCSeq: 7 OPTIONS\r\nContent-Length: 0\r\n\r\n";

    #[test]
    fn test_datagram() {
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(1, Transport::Udp), OPTIONS, OPTIONS.len());
        assert!(analysis.is_sip());
        assert_eq!(analysis.messages.len(), 1);
        let first = &analysis.messages[0];
        assert_eq!(first.message.method(), Some(&Method::Options));
        assert_eq!(first.correlation, Some(PerFrameResult::default()));
        assert_eq!(analyzer.stats().requests["OPTIONS"].count, 1);
    }

    #[test]
    fn test_reported_length_bounds_the_scan() {
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(1, Transport::Udp), OPTIONS, 50);
        let message = &analysis.messages[0].message;
        assert!(!message.headers_terminated);
        assert_eq!(message.end(), 50);
    }

    #[test]
    fn test_segment_with_two_messages() {
        let mut segment = OPTIONS.to_vec();
        segment.extend_from_slice(b"SIP/2.0 200 OK\r\nCall-ID: opt1\r\nCSeq: 7 OPTIONS\r\nContent-Length: 0\r\n\r\n");
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(3, Transport::Tcp), &segment, segment.len());
        assert_eq!(analysis.messages.len(), 2);
        assert_eq!(analysis.messages[1].index, 1);
        assert_eq!(analysis.consumed, segment.len());
        assert_eq!(analysis.need_more_data, None);
        assert_eq!(analyzer.stats().total_responses(), 1);
    }

    #[test]
    fn test_segment_needing_more_data() {
        let mut segment = OPTIONS.to_vec();
        segment.extend_from_slice(b"SIP/2.0 200 OK\r\nCall-ID: opt1\r\n");
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(3, Transport::Tcp), &segment, segment.len());
        assert_eq!(analysis.messages.len(), 1);
        assert_eq!(analysis.need_more_data, Some(OPTIONS.len()));
        assert_eq!(analysis.consumed, OPTIONS.len());
    }

    #[test]
    fn test_not_sip() {
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(1, Transport::Tcp), b"GET / HTTP/1.1\r\n\r\n", 18);
        assert!(!analysis.is_sip());
        assert!(analysis.messages.is_empty());
    }

    #[test]
    fn test_error_packet_has_no_summary() {
        let mut analyzer = Analyzer::default();
        let info = frame(1, Transport::Udp).with_error_packet();
        let analysis = analyzer.analyze(&info, OPTIONS, OPTIONS.len());
        assert_eq!(analysis.messages[0].summary, None);
        assert_eq!(analysis.messages[0].correlation, Some(PerFrameResult::default()));
        assert_eq!(analyzer.stats().total_requests(), 0);
    }

    #[test]
    fn test_revisit_does_not_count_twice() {
        let mut analyzer = Analyzer::default();
        let info = frame(1, Transport::Udp);
        analyzer.analyze(&info, OPTIONS, OPTIONS.len());
        let again = analyzer.analyze(&info.revisited(), OPTIONS, OPTIONS.len());
        assert!(again.messages[0].summary.is_some());
        assert_eq!(analyzer.stats().total_requests(), 1);

        analyzer.reset();
        assert!(analyzer.store().is_empty());
        assert_eq!(analyzer.stats().total_requests(), 0);
    }

    #[test]
    fn test_json_output() {
        let mut analyzer = Analyzer::default();
        let analysis = analyzer.analyze(&frame(1, Transport::Udp), OPTIONS, OPTIONS.len());
        let json = analysis.to_json().unwrap();
        assert!(json.contains("\"call_id\":\"opt1\""));
    }
}
