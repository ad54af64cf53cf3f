//! CSV output format for scope reports

use crate::scope_record::ScopeRecord;
use crate::stats::{LatencySummary, TimeUnit};

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header for one row per scope record
pub const SCOPE_HEADER: &str = "index,tag,ticks_start,ticks_end,machine_nominal_freq_hz,\
max_buffer_size,max_offset,elapsed_seconds,metadata_count";

/// One scope record as a CSV row (metadata is counted, not expanded)
pub fn scope_row(index: u64, scope: &ScopeRecord) -> String {
    [
        index.to_string(),
        escape_field(scope.tag()),
        scope.ticks_start().to_string(),
        scope.ticks_end().to_string(),
        scope.machine_nominal_freq_hz().to_string(),
        scope.max_buffer_size().to_string(),
        scope.max_offset().to_string(),
        scope.elapsed_seconds().to_string(),
        scope.metadata().len().to_string(),
    ]
    .join(",")
}

/// Tag counts as CSV
pub fn scope_counts_csv(counts: &[(String, usize)]) -> String {
    let mut output = String::from("scope,count\n");
    for (tag, count) in counts {
        output.push_str(&escape_field(tag));
        output.push(',');
        output.push_str(&count.to_string());
        output.push('\n');
    }
    output
}

/// A percentile summary as CSV
pub fn percentiles_csv(tag: &str, unit: TimeUnit, summary: &LatencySummary) -> String {
    let p = &summary.percentiles;
    format!(
        "scope,unit,count,min,mean,max,p50,p95,p99\n{},{},{},{},{},{},{},{},{}\n",
        escape_field(tag),
        unit,
        summary.count,
        summary.min,
        summary.mean,
        summary.max,
        p.p50,
        p.p95,
        p.p99
    )
}
