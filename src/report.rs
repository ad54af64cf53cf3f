//! Console reports: record dumps, tag counts and percentile tables
//!
//! Each report renders in any [`OutputFormat`]. Text is meant for people,
//! JSON and CSV for scripts.

use crate::cli::OutputFormat;
use crate::csv_output;
use crate::json_output::{JsonPercentiles, JsonScope, JsonScopeCounts};
use crate::scope_record::ScopeRecord;
use crate::stats::{LatencySummary, TimeUnit};
use anyhow::Result;
use std::io::Write;

/// Streams scope records to `out` one at a time
///
/// JSON output is one object per line so a capture never has to be held
/// in memory.
pub struct ScopeDump<W: Write> {
    out: W,
    format: OutputFormat,
    header_written: bool,
}

impl<W: Write> ScopeDump<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            header_written: false,
        }
    }

    pub fn write(&mut self, index: u64, scope: &ScopeRecord) -> Result<()> {
        match self.format {
            OutputFormat::Text => write_scope_text(&mut self.out, scope)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, &JsonScope { index, scope })?;
                writeln!(self.out)?;
            }
            OutputFormat::Csv => {
                if !self.header_written {
                    writeln!(self.out, "{}", csv_output::SCOPE_HEADER)?;
                    self.header_written = true;
                }
                writeln!(self.out, "{}", csv_output::scope_row(index, scope))?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        if matches!(self.format, OutputFormat::Csv) && !self.header_written {
            writeln!(self.out, "{}", csv_output::SCOPE_HEADER)?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

fn write_scope_text<W: Write>(out: &mut W, scope: &ScopeRecord) -> std::io::Result<()> {
    writeln!(out, "-------")?;
    writeln!(out, "  Tag: {}", scope.tag())?;
    writeln!(
        out,
        "  Ticks: {} - {}",
        scope.ticks_start(),
        scope.ticks_end()
    )?;
    writeln!(out, "  Machine Freq: {}", scope.machine_nominal_freq_hz())?;
    writeln!(out, "  MaxOffset: {}", scope.max_offset())?;
    writeln!(out, "  Elapsed: {:.9} s", scope.elapsed_seconds())?;
    for (i, m) in scope.metadata().iter().enumerate() {
        writeln!(
            out,
            "    Metadata #{}: {} Type={} Value={}",
            i,
            m.tag,
            m.type_name(),
            m.display_value()
        )?;
    }
    Ok(())
}

/// Render tag counts (already sorted) in `format`
pub fn render_scope_counts(counts: &[(String, usize)], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => scope_counts_table(counts),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&JsonScopeCounts::from_sorted(counts))?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => csv_output::scope_counts_csv(counts),
    };
    Ok(rendered)
}

fn scope_counts_table(counts: &[(String, usize)]) -> String {
    let total: usize = counts.iter().map(|(_, count)| count).sum();
    let width = counts
        .iter()
        .map(|(tag, _)| tag.len())
        .chain(["Scope".len(), "total".len()])
        .max()
        .unwrap_or(5);
    let rule = format!("{} {}", "-".repeat(width), "-".repeat(9));

    let mut table = String::new();
    table.push_str(&format!("{:<width$} {:>9}\n", "Scope", "Count"));
    table.push_str(&rule);
    table.push('\n');
    for (tag, count) in counts {
        table.push_str(&format!("{:<width$} {:>9}\n", tag, count));
    }
    table.push_str(&rule);
    table.push('\n');
    table.push_str(&format!("{:<width$} {:>9}\n", "total", total));
    table
}

/// Render one tag's percentile summary in `format`
pub fn render_percentiles(
    tag: &str,
    unit: TimeUnit,
    summary: &LatencySummary,
    format: OutputFormat,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => percentiles_table(tag, unit, summary),
        OutputFormat::Json => {
            let report = JsonPercentiles {
                scope: tag.to_string(),
                unit,
                summary: *summary,
            };
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
        OutputFormat::Csv => csv_output::percentiles_csv(tag, unit, summary),
    };
    Ok(rendered)
}

fn percentiles_table(tag: &str, unit: TimeUnit, summary: &LatencySummary) -> String {
    let p = &summary.percentiles;
    let count = summary.count;
    let mut table = format!("Scope: {tag} ({count} entries, times in {unit})\n");
    table.push_str(&format!(
        "{:>14} {:>14} {:>14} {:>14} {:>14} {:>14}\n",
        "min", "mean", "max", "p50", "p95", "p99"
    ));
    table.push_str(&format!("{}\n", vec!["-".repeat(14); 6].join(" ")));
    table.push_str(&format!(
        "{:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6} {:>14.6}\n",
        summary.min, summary.mean, summary.max, p.p50, p.p95, p.p99
    ));
    table
}
