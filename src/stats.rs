//! Elapsed-time series and percentile statistics for scope groups

use crate::scope_record::ScopeRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unit for extracted time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum TimeUnit {
    /// Seconds
    #[value(name = "s")]
    #[serde(rename = "s")]
    Seconds,
    /// Milliseconds
    #[default]
    #[value(name = "ms")]
    #[serde(rename = "ms")]
    Milliseconds,
    /// Nanoseconds
    #[value(name = "ns")]
    #[serde(rename = "ns")]
    Nanoseconds,
}

impl TimeUnit {
    /// Multiplier from seconds into this unit
    pub fn scale(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1e3,
            TimeUnit::Nanoseconds => 1e9,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Elapsed time of each record in `unit`, in record order
pub fn extract_times(records: &[ScopeRecord], unit: TimeUnit) -> Vec<f64> {
    let scale = unit.scale();
    records
        .iter()
        .map(|s| s.elapsed_seconds() * scale)
        .collect()
}

pub fn extract_seconds(records: &[ScopeRecord]) -> Vec<f64> {
    extract_times(records, TimeUnit::Seconds)
}

pub fn extract_milliseconds(records: &[ScopeRecord]) -> Vec<f64> {
    extract_times(records, TimeUnit::Milliseconds)
}

pub fn extract_nanoseconds(records: &[ScopeRecord]) -> Vec<f64> {
    extract_times(records, TimeUnit::Nanoseconds)
}

/// The p50/p95/p99 triple
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Descriptive statistics for a non-empty series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    #[serde(flatten)]
    pub percentiles: Percentiles,
}

/// Empirical quantile of ascending `sorted` data
///
/// Position `q * (n - 1)`, linearly interpolated between the two
/// neighbouring samples. Returns 0 for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let index = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn percentiles_of_sorted(sorted: &[f64]) -> Percentiles {
    Percentiles {
        p50: quantile(sorted, 0.50),
        p95: quantile(sorted, 0.95),
        p99: quantile(sorted, 0.99),
    }
}

/// p50, p95 and p99 of `values`
///
/// The input is left untouched. Empty input gives all zeros, which looks
/// the same as a series of zero latencies; use [`summarize`] when the
/// difference matters.
pub fn compute_percentiles(values: &[f64]) -> Percentiles {
    if values.is_empty() {
        return Percentiles::default();
    }
    percentiles_of_sorted(&sorted_copy(values))
}

/// Count, min, max, mean and percentiles, or `None` when there is no data
pub fn summarize(values: &[f64]) -> Option<LatencySummary> {
    if values.is_empty() {
        return None;
    }

    let sorted = sorted_copy(values);
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

    Some(LatencySummary {
        count: sorted.len(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        percentiles: percentiles_of_sorted(&sorted),
    })
}
