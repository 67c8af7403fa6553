//! Trace files and stream reassembly
//!
//! A trace holds one JSON object per line, each describing one captured
//! frame. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"frame":1,"transport":"udp","source":"192.0.2.1:5060","destination":"192.0.2.2:5060",
//!  "timestamp":"2024-05-01T10:00:00.000Z","text":"OPTIONS sip:bob@example.com SIP/2.0\r\n..."}
//! ```
//!
//! The payload is given either as `text` or as `hex`.

use anyhow::{bail, Context, Result};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sipscope_analyzer::{Analysis, Analyzer, FrameInfo, Transport};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::SocketAddr;
use std::path::Path;
use tracing::debug;

/// One captured frame of a trace file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub frame: u64,
    pub transport: Transport,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    /// Length on the wire when the capture was truncated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_len: Option<usize>,
    #[serde(default)]
    pub in_error_packet: bool,
}

impl TraceRecord {
    pub fn payload(&self) -> Result<Bytes> {
        match (&self.text, &self.hex) {
            (Some(text), None) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            (None, Some(encoded)) => {
                let raw: String = encoded.split_whitespace().collect();
                let decoded = hex::decode(raw).with_context(|| format!("frame {}: invalid hex payload", self.frame))?;
                Ok(Bytes::from(decoded))
            }
            _ => bail!("frame {} must have exactly one of `text` or `hex`", self.frame),
        }
    }

    pub fn frame_info(&self) -> FrameInfo {
        let info = FrameInfo::new(self.frame, self.transport, self.source, self.destination, self.timestamp);
        if self.in_error_packet {
            info.with_error_packet()
        } else {
            info
        }
    }
}

/// Read every record of a trace
pub fn read_trace(reader: impl BufRead) -> Result<Vec<TraceRecord>> {
    let mut records = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading trace line {}", number + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record: TraceRecord =
            serde_json::from_str(line).with_context(|| format!("parsing trace line {}", number + 1))?;
        records.push(record);
    }
    debug!(frames = records.len(), "trace loaded");
    Ok(records)
}

/// Read a trace from a file, or from stdin when `path` is `-`
pub fn open_trace(path: &Path) -> Result<Vec<TraceRecord>> {
    if path == Path::new("-") {
        return read_trace(io::stdin().lock());
    }
    let file = File::open(path).with_context(|| format!("opening trace {}", path.display()))?;
    read_trace(BufReader::new(file))
}

/// Accumulates stream bytes per direction until complete messages are
/// available
#[derive(Debug, Default)]
pub struct StreamReassembler {
    pending: HashMap<(SocketAddr, SocketAddr), BytesMut>,
}

impl StreamReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment and analyse everything buffered for its direction.
    ///
    /// Returns the analysis together with the bytes it was run on; ranges in
    /// the analysis index into those bytes.
    pub fn feed(&mut self, analyzer: &mut Analyzer, frame: &FrameInfo, segment: &[u8]) -> (Analysis, Bytes) {
        let key = (frame.source, frame.destination);
        let buffer = self.pending.entry(key).or_default();
        buffer.extend_from_slice(segment);
        let data = buffer.split().freeze();

        let analysis = analyzer.analyze(frame, &data, data.len());
        if let Some(offset) = analysis.need_more_data {
            debug!(frame = %frame.id, kept = data.len() - offset, "keeping partial message");
            buffer.extend_from_slice(&data[offset..]);
        }
        if buffer.is_empty() {
            self.pending.remove(&key);
        }
        (analysis, data)
    }

    /// Bytes still waiting for the rest of their message
    pub fn pending_bytes(&self) -> usize {
        self.pending.values().map(BytesMut::len).sum()
    }
}
