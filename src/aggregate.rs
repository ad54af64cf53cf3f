//! Grouping and counting scopes by tag
//!
//! Both views take the stream by value: they drain it, close it, and either
//! return a complete result or the first stream error. There is no partial
//! aggregation.

use crate::error::{Result, ScopeError};
use crate::scope_record::ScopeRecord;
use crate::stream::ScopeStream;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Tag → records, in stream order
pub type ScopeGroups = HashMap<String, Vec<ScopeRecord>>;

/// Tag → number of records
pub type ScopeCounts = HashMap<String, usize>;

/// Collect the records whose tag is in `wanted`
///
/// Tags that never occur get no entry at all; check membership, not length.
pub fn select_by_tag<R: Read>(
    mut stream: ScopeStream<R>,
    wanted: &HashSet<String>,
) -> Result<ScopeGroups> {
    let mut groups = ScopeGroups::new();

    while let Some(scope) = stream.next_scope()? {
        if wanted.contains(scope.tag()) {
            groups
                .entry(scope.tag().to_string())
                .or_default()
                .push(scope);
        }
    }

    debug!(
        scanned = stream.records_read(),
        tags = groups.len(),
        "selected scopes by tag"
    );
    stream.close();
    Ok(groups)
}

/// Count every record by tag
pub fn count_by_tag<R: Read>(mut stream: ScopeStream<R>) -> Result<ScopeCounts> {
    let mut counts = ScopeCounts::new();

    while let Some(scope) = stream.next_scope()? {
        *counts.entry(scope.tag().to_string()).or_insert(0) += 1;
    }

    debug!(
        scanned = stream.records_read(),
        tags = counts.len(),
        "counted scopes by tag"
    );
    stream.close();
    Ok(counts)
}

/// Open `path` and run [`select_by_tag`] over it
pub fn select_by_tag_in(path: impl AsRef<Path>, wanted: &HashSet<String>) -> Result<ScopeGroups> {
    select_by_tag(ScopeStream::open(path)?, wanted)
}

/// Open `path` and run [`count_by_tag`] over it
pub fn count_by_tag_in(path: impl AsRef<Path>) -> Result<ScopeCounts> {
    count_by_tag(ScopeStream::open(path)?)
}

/// Take one tag's records out of a selection
///
/// A missing or empty group is an `EmptySelection` error.
pub fn take_group(groups: &mut ScopeGroups, tag: &str) -> Result<Vec<ScopeRecord>> {
    match groups.remove(tag) {
        Some(records) if !records.is_empty() => Ok(records),
        _ => Err(ScopeError::EmptySelection {
            tag: tag.to_string(),
        }),
    }
}

/// Counts sorted by tag name
pub fn sorted_counts(counts: &ScopeCounts) -> Vec<(String, usize)> {
    let mut sorted: Vec<(String, usize)> = counts
        .iter()
        .map(|(tag, count)| (tag.clone(), *count))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
}
