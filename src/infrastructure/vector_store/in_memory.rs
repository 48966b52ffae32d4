use async_trait::async_trait;
use std::sync::RwLock;

use super::rank;
use crate::domain::{ports::VectorStore, DomainError, Embedding, IndexEntry, SearchResult};

/// Process-local index; gone when the process exits.
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn exists(&self) -> Result<bool, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(!store.is_empty())
    }

    async fn persist(&self, entries: &[IndexEntry]) -> Result<(), DomainError> {
        let mut store = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if !store.is_empty() {
            return Err(DomainError::conflict("an index already exists in memory"));
        }
        store.extend_from_slice(entries);
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(rank(store.iter(), query, top_k))
    }
}
