//! Memory-search backends. Both are searched concurrently; a failing or slow
//! backend contributes nothing and never fails the request.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{CitationError, CitationResult, ErrorChain};
use crate::types::MemoryEntry;

/// What to search memory for.
#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    pub text: String,
    /// Assets named by the structured sources; asset-scoped backends filter on these.
    pub asset_ids: Vec<String>,
    pub limit: usize,
}

/// A semantic-memory search collaborator.
#[allow(async_fn_in_trait)]
pub trait MemoryBackend: Send + Sync {
    /// Backend name for logs and error attribution.
    fn name(&self) -> &str;

    async fn search(&self, query: &MemoryQuery) -> CitationResult<Vec<MemoryEntry>>;
}

/// Backend that never returns anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl MemoryBackend for NoMemory {
    fn name(&self) -> &str {
        "none"
    }

    async fn search(&self, _query: &MemoryQuery) -> CitationResult<Vec<MemoryEntry>> {
        Ok(Vec::new())
    }
}

/// Search both backends concurrently, each bounded by `timeout`.
///
/// Failures are logged, recorded in `errors` and treated as empty results.
pub async fn gather_memories<G, A>(
    generic: &G,
    asset_scoped: &A,
    query: &MemoryQuery,
    timeout: Duration,
    errors: &mut ErrorChain,
) -> Vec<MemoryEntry>
where
    G: MemoryBackend,
    A: MemoryBackend,
{
    let (generic_result, asset_result) = tokio::join!(
        tokio::time::timeout(timeout, generic.search(query)),
        tokio::time::timeout(timeout, asset_scoped.search(query)),
    );

    let mut batches = Vec::with_capacity(2);
    for (step, (name, result)) in [
        (generic.name(), generic_result),
        (asset_scoped.name(), asset_result),
    ]
    .into_iter()
    .enumerate()
    {
        let error = match result {
            Ok(Ok(entries)) => {
                debug!(backend = name, count = entries.len(), "Memory backend returned");
                batches.push(entries);
                continue;
            }
            Ok(Err(e)) => CitationError::SourceGatherFailed {
                backend: name.to_string(),
                reason: e.to_string(),
            },
            Err(_) => CitationError::SourceGatherFailed {
                backend: name.to_string(),
                reason: format!("timed out after {}ms", timeout.as_millis()),
            },
        };
        warn!(backend = name, error = %error, "Memory backend failed, continuing without it");
        errors.push("memory", step, error);
    }

    merge_memories(batches)
}

/// Concatenate batches in order, keeping the first entry seen per memory id.
pub fn merge_memories(batches: Vec<Vec<MemoryEntry>>) -> Vec<MemoryEntry> {
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|entry| seen.insert(entry.memory_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_dedupes_by_memory_id() {
        let merged = merge_memories(vec![
            vec![MemoryEntry::new("m1", "a"), MemoryEntry::new("m2", "b")],
            vec![MemoryEntry::new("m2", "b again"), MemoryEntry::new("m3", "c")],
        ]);
        let ids: Vec<&str> = merged.iter().map(|m| m.memory_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(merged[1].content, "b");
    }
}
