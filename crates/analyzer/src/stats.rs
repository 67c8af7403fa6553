//! Per-message summary records and their aggregation
//!
//! Every dissected message yields a [`SipSummary`]. [`SipStats`] folds them
//! into request counts per method and response counts per status code, with
//! resend counts and setup time figures per row.

use crate::correlation::PerFrameResult;
use crate::message::SipMessage;
use crate::parser::utils::unfold_lws;
use crate::types::{FrameId, HeaderKind, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status codes with their own statistics row. The `x99` entries collect
/// every other code of their class.
pub const WELL_KNOWN_CODES: &[(u16, &str)] = &[
    (100, "Trying"),
    (180, "Ringing"),
    (181, "Call Is Being Forwarded"),
    (182, "Queued"),
    (183, "Session Progress"),
    (199, "Informational - Others"),
    (200, "OK"),
    (202, "Accepted"),
    (204, "No Notification"),
    (299, "Success - Others"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Moved Temporarily"),
    (305, "Use Proxy"),
    (380, "Alternative Service"),
    (399, "Redirection - Others"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (410, "Gone"),
    (412, "Conditional Request Failed"),
    (413, "Request Entity Too Large"),
    (414, "Request-URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Unsupported URI Scheme"),
    (420, "Bad Extension"),
    (421, "Extension Required"),
    (422, "Session Timer Too Small"),
    (423, "Interval Too Brief"),
    (428, "Use Identity Header"),
    (429, "Provide Referrer Identity"),
    (430, "Flow Failed"),
    (433, "Anonymity Disallowed"),
    (436, "Bad Identity-Info"),
    (437, "Unsupported Certificate"),
    (438, "Invalid Identity Header"),
    (439, "First Hop Lacks Outbound Support"),
    (440, "Max-Breadth Exceeded"),
    (470, "Consent Needed"),
    (480, "Temporarily Unavailable"),
    (481, "Call/Transaction Does Not Exist"),
    (482, "Loop Detected"),
    (483, "Too Many Hops"),
    (484, "Address Incomplete"),
    (485, "Ambiguous"),
    (486, "Busy Here"),
    (487, "Request Terminated"),
    (488, "Not Acceptable Here"),
    (489, "Bad Event"),
    (491, "Request Pending"),
    (493, "Undecipherable"),
    (494, "Security Agreement Required"),
    (499, "Client Error - Others"),
    (500, "Server Internal Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Server Time-out"),
    (505, "Version Not Supported"),
    (513, "Message Too Large"),
    (599, "Server Error - Others"),
    (600, "Busy Everywhere"),
    (603, "Decline"),
    (604, "Does Not Exist Anywhere"),
    (606, "Not Acceptable"),
    (699, "Global Failure - Others"),
];

/// Row for codes outside 100-699
pub const UNKNOWN_RESPONSE_CODE: u16 = 999;

/// Description of a well-known status code
pub fn code_description(code: u16) -> Option<&'static str> {
    WELL_KNOWN_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, text)| *text)
}

/// Statistics row a status code is counted under
pub fn code_bucket(code: u16) -> u16 {
    if !(100..=699).contains(&code) {
        UNKNOWN_RESPONSE_CODE
    } else if code_description(code).is_some() {
        code
    } else {
        code / 100 * 100 + 99
    }
}

/// What the statistics sink learns about one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipSummary {
    pub frame: FrameId,
    pub index: u16,
    pub method: Option<Method>,
    pub status_code: Option<u16>,
    pub reason_phrase: Option<String>,
    pub resend: bool,
    pub setup_time_ms: Option<i64>,
    pub response_time_ms: Option<i64>,
    pub call_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SipSummary {
    pub fn new(frame: FrameId, index: u16, buf: &[u8], message: &SipMessage, result: &PerFrameResult) -> Self {
        let raw = |kind: HeaderKind| {
            message
                .header(kind)
                .map(|h| String::from_utf8_lossy(&unfold_lws(h.raw_value(buf))).into_owned())
        };
        Self {
            frame,
            index,
            method: message.method().cloned(),
            status_code: message.status_code(),
            reason_phrase: message
                .reason_phrase(buf)
                .map(|r| String::from_utf8_lossy(r).into_owned()),
            resend: result.is_resend(),
            setup_time_ms: result.setup_time_ms,
            response_time_ms: result.response_time_ms,
            call_id: message.call_id.clone(),
            from: raw(HeaderKind::From),
            to: raw(HeaderKind::To),
        }
    }
}

/// Counters for one request method or response code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub count: u64,
    pub resent: u64,
    pub setup_count: u64,
    pub setup_total_ms: i64,
    pub min_setup_ms: Option<i64>,
    pub max_setup_ms: Option<i64>,
}

impl StatRow {
    fn record(&mut self, summary: &SipSummary) {
        self.count += 1;
        if summary.resend {
            self.resent += 1;
        }
        if let Some(setup) = summary.setup_time_ms.filter(|&ms| ms > 0) {
            self.setup_count += 1;
            self.setup_total_ms += setup;
            self.min_setup_ms = Some(self.min_setup_ms.map_or(setup, |min| min.min(setup)));
            self.max_setup_ms = Some(self.max_setup_ms.map_or(setup, |max| max.max(setup)));
        }
    }

    pub fn avg_setup_ms(&self) -> Option<f64> {
        (self.setup_count > 0).then(|| self.setup_total_ms as f64 / self.setup_count as f64)
    }
}

/// Aggregated request and response statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SipStats {
    /// Keyed by method name
    pub requests: BTreeMap<String, StatRow>,
    /// Keyed by [`code_bucket`]
    pub responses: BTreeMap<u16, StatRow>,
}

impl SipStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: &SipSummary) {
        if let Some(code) = summary.status_code {
            self.responses.entry(code_bucket(code)).or_default().record(summary);
        } else if let Some(method) = &summary.method {
            self.requests
                .entry(method.as_str().to_string())
                .or_default()
                .record(summary);
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.requests.values().map(|r| r.count).sum()
    }

    pub fn total_responses(&self) -> u64 {
        self.responses.values().map(|r| r.count).sum()
    }

    pub fn total_resent(&self) -> u64 {
        self.requests
            .values()
            .chain(self.responses.values())
            .map(|r| r.resent)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(method: Option<Method>, code: Option<u16>, resend: bool, setup: Option<i64>) -> SipSummary {
        SipSummary {
            frame: FrameId(1),
            index: 0,
            method,
            status_code: code,
            reason_phrase: None,
            resend,
            setup_time_ms: setup,
            response_time_ms: None,
            call_id: None,
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_code_buckets() {
        assert_eq!(code_bucket(200), 200);
        assert_eq!(code_bucket(201), 299);
        assert_eq!(code_bucket(199), 199);
        assert_eq!(code_bucket(150), 199);
        assert_eq!(code_bucket(486), 486);
        assert_eq!(code_bucket(450), 499);
        assert_eq!(code_bucket(607), 699);
        assert_eq!(code_bucket(99), UNKNOWN_RESPONSE_CODE);
        assert_eq!(code_description(603), Some("Decline"));
    }

    #[test]
    fn test_request_and_response_rows() {
        let mut stats = SipStats::new();
        stats.record(&summary(Some(Method::Invite), None, false, None));
        stats.record(&summary(Some(Method::Invite), None, true, None));
        stats.record(&summary(None, Some(200), false, None));
        stats.record(&summary(None, Some(202), false, None));
        stats.record(&summary(None, Some(201), false, None));

        let invite = &stats.requests["INVITE"];
        assert_eq!(invite.count, 2);
        assert_eq!(invite.resent, 1);
        assert_eq!(stats.responses[&299].count, 1);
        assert_eq!(stats.total_requests(), 2);
        assert_eq!(stats.total_responses(), 3);
        assert_eq!(stats.total_resent(), 1);
    }

    #[test]
    fn test_setup_times() {
        let mut stats = SipStats::new();
        stats.record(&summary(Some(Method::Ack), None, false, Some(1000)));
        stats.record(&summary(Some(Method::Ack), None, false, Some(3000)));
        stats.record(&summary(Some(Method::Ack), None, false, Some(0)));
        let ack = &stats.requests["ACK"];
        assert_eq!(ack.count, 3);
        assert_eq!(ack.setup_count, 2);
        assert_eq!(ack.min_setup_ms, Some(1000));
        assert_eq!(ack.max_setup_ms, Some(3000));
        assert_eq!(ack.avg_setup_ms(), Some(2000.0));
    }
}
