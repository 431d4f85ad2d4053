//! Human-readable function timing reports
//!
//! Renders one function's accumulated line timings as a text table: a timer
//! unit header, the function's total time, its source location, then one row
//! per recorded line with hits, time, per-hit time and percentage. The format
//! is append-friendly: every report is self-contained, so a log file holding
//! many cumulative reports stays readable by hand.
//!
//! Line contents are read from the source file when it is reachable from the
//! working directory; rows render with empty contents otherwise. Missing
//! source is never an error.

use std::fs;
use std::io;

use crate::engine::{FunctionSite, TimingRecord};

/// Column header row of the per-line table
const TABLE_HEADER: &str = "  Line #      Hits          Time  Per Hit   % Time  Line Contents";

/// Write one function's cumulative timing report to `out`.
///
/// `unit` is the engine's timer resolution in seconds per tick and scales the
/// recorded tick totals for the "Total time" header. I/O errors from `out`
/// propagate to the caller.
pub fn render_function_report<W: io::Write>(
    site: &FunctionSite,
    record: &TimingRecord,
    unit: f64,
    out: &mut W,
) -> io::Result<()> {
    let source = fs::read_to_string(site.file).unwrap_or_default();
    let source_lines: Vec<&str> = source.lines().collect();

    let total_ticks = record.total_time_ns();
    writeln!(out, "Timer unit: {unit:e} s")?;
    writeln!(out)?;
    writeln!(out, "Total time: {:.6} s", total_ticks as f64 * unit)?;
    writeln!(out, "File: {}", site.file)?;
    writeln!(out, "Function: {} at line {}", site.name, site.line)?;
    writeln!(out)?;
    writeln!(out, "{TABLE_HEADER}")?;
    writeln!(out, "{}", "=".repeat(TABLE_HEADER.len()))?;

    for (line, counter) in record.lines() {
        let per_hit = if counter.hits > 0 {
            counter.total_time_ns as f64 / counter.hits as f64
        } else {
            0.0
        };
        let percent = if total_ticks > 0 {
            counter.total_time_ns as f64 / total_ticks as f64 * 100.0
        } else {
            0.0
        };
        let contents = source_lines
            .get(line.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("");
        writeln!(
            out,
            "{:>8} {:>9} {:>13} {:>8.1} {:>8.1}  {}",
            line, counter.hits, counter.total_time_ns, per_hit, percent, contents
        )?;
    }
    writeln!(out)?;

    Ok(())
}
