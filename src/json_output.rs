//! JSON output format for scope reports

use crate::scope_record::ScopeRecord;
use crate::stats::{LatencySummary, TimeUnit};
use serde::Serialize;

/// One scope record with its position in the capture
#[derive(Debug, Serialize)]
pub struct JsonScope<'a> {
    pub index: u64,
    #[serde(flatten)]
    pub scope: &'a ScopeRecord,
}

/// Count for a single tag
#[derive(Debug, Clone, Serialize)]
pub struct JsonScopeCount {
    pub scope: String,
    pub count: usize,
}

/// Tag counts for a whole capture
#[derive(Debug, Clone, Serialize)]
pub struct JsonScopeCounts {
    pub scopes: Vec<JsonScopeCount>,
    pub total: usize,
}

impl JsonScopeCounts {
    pub fn from_sorted(counts: &[(String, usize)]) -> Self {
        Self {
            scopes: counts
                .iter()
                .map(|(scope, count)| JsonScopeCount {
                    scope: scope.clone(),
                    count: *count,
                })
                .collect(),
            total: counts.iter().map(|(_, count)| count).sum(),
        }
    }
}

/// Percentile summary for one tag
#[derive(Debug, Clone, Serialize)]
pub struct JsonPercentiles {
    pub scope: String,
    pub unit: TimeUnit,
    #[serde(flatten)]
    pub summary: LatencySummary,
}
