mod in_memory;
mod local;

pub use in_memory::InMemoryVectorStore;
pub use local::{LocalVectorStore, INDEX_FILE};

use crate::domain::{Embedding, IndexEntry, SearchResult};

/// Best `top_k` entries by relevance to `query`, highest first.
fn rank<'a>(
    entries: impl Iterator<Item = &'a IndexEntry>,
    query: &Embedding,
    top_k: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = entries
        .map(|entry| SearchResult {
            chunk: entry.chunk.clone(),
            score: query.relevance(&entry.embedding),
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    results
}
