//! sipscope: analyse SIP traffic from a trace of captured frames
//!
//! Every frame is dissected and correlated in capture order. Stream
//! transports are reassembled per direction. With `--passes` above one the
//! capture is replayed with every frame flagged as visited, and only the last
//! pass is printed; results must not change between passes.

mod report;
mod trace;

use anyhow::{Context, Result};
use clap::Parser;
use report::OutputFormat;
use sipscope_analyzer::{parse_log_level, setup_logging, Analyzer, AnalyzerConfig, LoggingConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use trace::{open_trace, StreamReassembler};

#[derive(Parser, Debug)]
#[command(name = "sipscope", version, about = "Analyse captured SIP traffic")]
struct Cli {
    /// Trace file with one JSON frame per line, `-` for stdin
    trace: PathBuf,

    /// Analyzer configuration file (TOML)
    #[arg(short, long, env = "SIPSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, default_value = "warn", env = "SIPSCOPE_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Include file and line numbers in logs
    #[arg(long)]
    file_info: bool,

    /// Log span enter and exit events
    #[arg(long)]
    log_spans: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Number of analysis passes over the trace
    #[arg(long, default_value_t = 1)]
    passes: u32,

    /// Match retransmissions sent from a different source port
    #[arg(long)]
    any_source_port: bool,

    /// Extra header name to accept without a warning (repeatable)
    #[arg(long = "custom-header", value_name = "NAME")]
    custom_headers: Vec<String>,

    /// Skip the statistics summary
    #[arg(long)]
    no_stats: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn logging(&self) -> Result<LoggingConfig> {
        let level = parse_log_level(&self.log_level)?;
        let mut logging = LoggingConfig::new(level, "sipscope");
        if self.json_logs {
            logging = logging.with_json();
        }
        if self.file_info {
            logging = logging.with_file_info();
        }
        if self.log_spans {
            logging = logging.with_span_events();
        }
        Ok(logging)
    }

    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => AnalyzerConfig::default(),
        };
        if self.any_source_port {
            config = config.with_retrans_same_source_port(false);
        }
        for name in &self.custom_headers {
            config = config.with_custom_header(name.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.logging()?)?;
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = cli.analyzer_config()?;
    let records = open_trace(&cli.trace)?;
    info!(frames = records.len(), passes = cli.passes, "starting analysis");

    let mut analyzer = Analyzer::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let passes = cli.passes.max(1);

    for pass in 1..=passes {
        let mut reassembler = StreamReassembler::new();
        for record in &records {
            let mut frame = record.frame_info();
            if pass > 1 {
                frame = frame.revisited();
            }
            let payload = record.payload()?;
            let reported_len = record.reported_len.unwrap_or(payload.len());

            let (analysis, data) = if frame.transport.is_stream() {
                let segment = &payload[..reported_len.min(payload.len())];
                reassembler.feed(&mut analyzer, &frame, segment)
            } else {
                (analyzer.analyze(&frame, &payload, reported_len), payload)
            };

            if pass == passes {
                report::write_analysis(&mut out, &frame, &analysis, &data, cli.format)?;
            }
        }
        if reassembler.pending_bytes() > 0 {
            info!(bytes = reassembler.pending_bytes(), "trace ended inside a message");
        }
    }

    if !cli.no_stats {
        report::write_stats(&mut out, analyzer.stats(), cli.format)?;
    }
    out.flush()?;
    Ok(())
}
