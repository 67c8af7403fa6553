//! Text and JSON rendering of analysis results

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use sipscope_analyzer::parser::LineKind;
use sipscope_analyzer::stats::{code_description, StatRow, UNKNOWN_RESPONSE_CODE};
use sipscope_analyzer::{Analysis, FrameInfo, MessageAnalysis, SipStats};
use std::io::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Write the result of one frame
pub fn write_analysis(
    out: &mut impl Write,
    frame: &FrameInfo,
    analysis: &Analysis,
    data: &[u8],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", analysis.to_json()?)?,
        OutputFormat::Text => write_text(out, frame, analysis, data)?,
    }
    Ok(())
}

fn write_text(out: &mut impl Write, frame: &FrameInfo, analysis: &Analysis, data: &[u8]) -> Result<()> {
    let prefix = format!(
        "{:>5} {:<4} {} -> {}",
        frame.id, frame.transport, frame.source, frame.destination
    );
    if analysis.not_sip {
        writeln!(out, "{} {}", prefix, "not SIP".dimmed())?;
        return Ok(());
    }
    for message in &analysis.messages {
        writeln!(out, "{}#{} {}", prefix, message.index, describe(message, data))?;
        for warning in message.message.all_warnings() {
            let text = data
                .get(warning.span.clone())
                .map(String::from_utf8_lossy)
                .unwrap_or_default();
            writeln!(out, "        {} {}: {:?}", "warning".red(), warning.kind, text)?;
        }
    }
    if let Some(offset) = analysis.need_more_data {
        writeln!(out, "{} {}", prefix, format!("waiting for more data at offset {}", offset).dimmed())?;
    }
    Ok(())
}

fn describe(analysis: &MessageAnalysis, data: &[u8]) -> String {
    let message = &analysis.message;
    let mut line = match &message.line {
        LineKind::RequestLine {
            method, request_uri, ..
        } => {
            let uri = data.get(request_uri.clone()).map(String::from_utf8_lossy).unwrap_or_default();
            if method.is_known() {
                format!("Request: {} {}", method, uri)
            } else {
                format!("Unknown request: {} {}", method, uri)
            }
        }
        LineKind::StatusLine { code, reason, .. } => {
            let reason = data.get(reason.clone()).map(String::from_utf8_lossy).unwrap_or_default();
            format!("Status: {} {}", code, reason)
        }
        LineKind::Other => "Continuation".to_string(),
    };

    if let Some(result) = &analysis.correlation {
        if let Some(original) = result.original_frame_of_resend {
            line.push_str(&format!(" {}", format!("[resend of {}]", original).yellow()));
        }
        match (result.matching_request_frame, result.setup_time_ms, result.response_time_ms) {
            (Some(invite), Some(setup), _) => line.push_str(&format!(" [ACK for {}, setup {} ms]", invite, setup)),
            (Some(request), _, Some(elapsed)) => {
                line.push_str(&format!(" [response to {} in {} ms]", request, elapsed))
            }
            (Some(request), _, None) => line.push_str(&format!(" [response to {}]", request)),
            _ => {}
        }
        if let Some(release) = result.release_time_ms {
            line.push_str(&format!(" [release {} ms]", release));
        }
    }
    if let Some(registration) = &analysis.registration {
        line.push_str(&format!(" ({})", registration));
    }
    line
}

#[derive(Tabled)]
struct StatsLine {
    #[tabled(rename = "Method / Code")]
    name: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Resent")]
    resent: u64,
    #[tabled(rename = "Min setup (s)")]
    min_setup: String,
    #[tabled(rename = "Avg setup (s)")]
    avg_setup: String,
    #[tabled(rename = "Max setup (s)")]
    max_setup: String,
}

fn seconds(ms: Option<f64>) -> String {
    ms.map(|ms| format!("{:.3}", ms / 1000.0)).unwrap_or_else(|| "-".to_string())
}

fn stats_line(name: String, row: &StatRow) -> StatsLine {
    StatsLine {
        name,
        count: row.count,
        resent: row.resent,
        min_setup: seconds(row.min_setup_ms.map(|ms| ms as f64)),
        avg_setup: seconds(row.avg_setup_ms()),
        max_setup: seconds(row.max_setup_ms.map(|ms| ms as f64)),
    }
}

fn code_label(code: u16) -> String {
    if code == UNKNOWN_RESPONSE_CODE {
        return format!("{} Unknown response", code);
    }
    match code_description(code) {
        Some(text) => format!("{} {}", code, text),
        None => code.to_string(),
    }
}

/// Write the aggregated statistics
pub fn write_stats(out: &mut impl Write, stats: &SipStats, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", json!({ "stats": stats }))?;
        }
        OutputFormat::Text => {
            let lines: Vec<StatsLine> = stats
                .requests
                .iter()
                .map(|(method, row)| stats_line(method.clone(), row))
                .chain(stats.responses.iter().map(|(code, row)| stats_line(code_label(*code), row)))
                .collect();
            if lines.is_empty() {
                writeln!(out, "no SIP messages")?;
                return Ok(());
            }
            writeln!(out)?;
            writeln!(out, "{}", Table::new(lines).with(Style::rounded()))?;
            writeln!(
                out,
                "{} requests, {} responses, {} resent",
                stats.total_requests(),
                stats.total_responses(),
                stats.total_resent()
            )?;
        }
    }
    Ok(())
}
