use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Embedding, DomainError>;

    /// One vector per text, in input order. Empty input must not hit the
    /// remote model.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError>;

    fn model(&self) -> &str;
    fn dimension(&self) -> usize;
}
