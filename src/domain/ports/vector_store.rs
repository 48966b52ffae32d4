use crate::domain::{errors::DomainError, Embedding, IndexEntry, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether the store already holds a committed index.
    async fn exists(&self) -> Result<bool, DomainError>;

    /// Writes a whole index. Stores never append to an existing one.
    async fn persist(&self, entries: &[IndexEntry]) -> Result<(), DomainError>;

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
}
