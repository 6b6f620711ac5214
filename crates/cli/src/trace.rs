//! CSR event trace replay.
//!
//! A trace is a text file with one event per line:
//!
//! ```text
//! # comment
//! w mstatus 0x8      write 0x8 to mstatus
//! r 14 0xb           read of CSR id 14 (mcause) returning 0xb
//! t                  clock tick
//! ```
//!
//! Registers are given by name or by numeric id; values are decimal or `0x` hex.
//! Events are emitted on a `CsrEventBus` with a bound highlight tracker, and the
//! highlighted registers are printed at the end of every cycle.

use std::io::Write;
use std::path::{Path, PathBuf};

use rvsim_machine::common::InvalidRegister;
use rvsim_machine::csr::CsrId;
use rvsim_machine::csr::events::CsrEventBus;
use rvsim_machine::monitor::{HighlightKind, HighlightRow, RegisterHighlightTracker};
use thiserror::Error;

/// One parsed trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// Register write.
    Write(CsrId, u64),
    /// Register read.
    Read(CsrId, u64),
    /// End of a clock cycle.
    Tick,
}

/// Trace loading and replay failures.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("trace file {path}: {source}")]
    Io {
        /// Path of the trace.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid event.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What is wrong with the line.
        message: String,
    },

    /// An event named a register outside the CSR namespace.
    #[error("line {line}: {source}")]
    Register {
        /// 1-based line number.
        line: usize,
        /// Tracker error.
        #[source]
        source: InvalidRegister,
    },

    /// Writing the report failed.
    #[error("writing replay output: {0}")]
    Output(#[from] std::io::Error),
}

/// Counts of what a replay processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Write events.
    pub writes: usize,
    /// Read events.
    pub reads: usize,
    /// Clock ticks.
    pub cycles: usize,
}

fn parse_register(token: &str) -> Result<CsrId, String> {
    if let Some(id) = CsrId::from_name(token) {
        return Ok(id);
    }
    token
        .parse::<usize>()
        .map(CsrId::new)
        .map_err(|_| format!("unknown CSR `{token}`"))
}

fn parse_value(token: &str) -> Result<u64, String> {
    let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => token.parse(),
    };
    parsed.map_err(|e| format!("bad value `{token}`: {e}"))
}

/// Parses a single trace line; blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<TraceEvent>, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut tokens = line.split_whitespace();
    let Some(kind) = tokens.next() else {
        return Ok(None);
    };
    let event = match kind {
        "t" | "tick" => TraceEvent::Tick,
        "w" | "write" | "r" | "read" => {
            let reg = tokens.next().ok_or("missing register")?;
            let value = tokens.next().ok_or("missing value")?;
            let id = parse_register(reg)?;
            let value = parse_value(value)?;
            if kind.starts_with('w') {
                TraceEvent::Write(id, value)
            } else {
                TraceEvent::Read(id, value)
            }
        }
        other => return Err(format!("unknown event `{other}`")),
    };
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected `{extra}`"));
    }
    Ok(Some(event))
}

/// Parses a whole trace, keeping the 1-based line number of each event.
pub fn parse(text: &str) -> Result<Vec<(usize, TraceEvent)>, TraceError> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        match parse_line(line) {
            Ok(Some(event)) => events.push((line_no, event)),
            Ok(None) => {}
            Err(message) => {
                return Err(TraceError::Parse {
                    line: line_no,
                    message,
                });
            }
        }
    }
    Ok(events)
}

/// Reads and parses a trace file.
pub fn load(path: &Path) -> Result<Vec<(usize, TraceEvent)>, TraceError> {
    let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

const fn kind_label(kind: HighlightKind) -> &'static str {
    match kind {
        HighlightKind::None => "",
        HighlightKind::Written => "written",
        HighlightKind::ReadOnly => "read",
    }
}

fn write_rows<'a, W: Write>(
    out: &mut W,
    rows: impl Iterator<Item = &'a HighlightRow>,
) -> Result<(), TraceError> {
    for row in rows {
        let text = if row.text.is_empty() { "-" } else { &row.text };
        writeln!(out, "  {:<12} {:<20} {}", row.name, text, kind_label(row.kind))?;
    }
    Ok(())
}

/// Replays `events` through a bound tracker, reporting highlights per cycle.
///
/// With `all`, the final register table includes untouched registers.
pub fn replay<W: Write>(
    events: &[(usize, TraceEvent)],
    out: &mut W,
    all: bool,
) -> Result<ReplaySummary, TraceError> {
    let bus = CsrEventBus::new();
    let mut tracker = RegisterHighlightTracker::new();
    tracker.bind(&bus);
    let mut summary = ReplaySummary::default();

    for &(line, event) in events {
        match event {
            TraceEvent::Write(id, value) => {
                bus.emit_write(id, value)
                    .map_err(|source| TraceError::Register { line, source })?;
                summary.writes += 1;
            }
            TraceEvent::Read(id, value) => {
                bus.emit_read(id, value)
                    .map_err(|source| TraceError::Register { line, source })?;
                summary.reads += 1;
            }
            TraceEvent::Tick => {
                if tracker.is_dirty() {
                    writeln!(out, "cycle {}:", summary.cycles)?;
                    let rows = tracker.rows();
                    write_rows(out, rows.iter().filter(|r| r.kind != HighlightKind::None))?;
                }
                bus.emit_tick();
                summary.cycles += 1;
            }
        }
    }

    writeln!(out, "final:")?;
    let rows = tracker.rows();
    write_rows(out, rows.iter().filter(|r| all || !r.text.is_empty()))?;
    tracing::info!(
        writes = summary.writes,
        reads = summary.reads,
        cycles = summary.cycles,
        "replay finished"
    );
    Ok(summary)
}
