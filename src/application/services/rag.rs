use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, IndexEntry, SearchResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Something was already persisted; nothing was embedded.
    AlreadyPresent,
    /// No chunks to index; a single placeholder entry was stored.
    Placeholder,
    Built { entries: usize },
}

/// The vector index: embeds chunks at build time and queries at search time.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    pub async fn exists(&self) -> Result<bool, DomainError> {
        self.vector_store.exists().await
    }

    /// Builds the index once. An existing index is left untouched, however
    /// stale it may be.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn build(&self, chunks: &[DocumentChunk]) -> Result<BuildOutcome, DomainError> {
        if self.vector_store.exists().await? {
            tracing::info!("index already present, skipping build");
            return Ok(BuildOutcome::AlreadyPresent);
        }

        if chunks.is_empty() {
            tracing::warn!("no documents to index, storing placeholder");
            self.vector_store
                .persist(&[IndexEntry::placeholder()])
                .await?;
            return Ok(BuildOutcome::Placeholder);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedding.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect();
        self.vector_store.persist(&entries).await?;

        tracing::info!(entries = entries.len(), model = self.embedding.model(), "index built");
        Ok(BuildOutcome::Built {
            entries: entries.len(),
        })
    }

    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed_query(query).await?;
        self.vector_store.search(&embedding, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryVectorStore;
    use crate::test_support::FakeEmbedding;

    fn service() -> (RagService, Arc<FakeEmbedding>) {
        let embedding = Arc::new(FakeEmbedding::default());
        let rag = RagService::new(embedding.clone(), Arc::new(InMemoryVectorStore::new()), 3);
        (rag, embedding)
    }

    #[tokio::test]
    async fn test_build_then_search() {
        let (rag, _) = service();
        assert!(!rag.exists().await.unwrap());

        let chunks = vec![
            DocumentChunk::new("docs/hr.txt", "Vacation days: 25 per year.", 0),
            DocumentChunk::new("docs/it.txt", "Use the VPN on every laptop.", 0),
            DocumentChunk::new("docs/hr.txt", "Sick leave needs a note after 3 days.", 1),
        ];
        let outcome = rag.build(&chunks).await.unwrap();
        assert_eq!(outcome, BuildOutcome::Built { entries: 3 });
        assert!(rag.exists().await.unwrap());

        let results = rag.retrieve("How do I connect to the VPN?").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.source, "docs/it.txt");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_second_build_is_skipped() {
        let (rag, embedding) = service();
        let chunks = vec![DocumentChunk::new("docs/hr.txt", "Vacation days", 0)];
        rag.build(&chunks).await.unwrap();
        let calls = embedding.calls();

        assert_eq!(rag.build(&chunks).await.unwrap(), BuildOutcome::AlreadyPresent);
        assert_eq!(embedding.calls(), calls);
    }

    #[tokio::test]
    async fn test_empty_corpus_stores_placeholder() {
        let (rag, embedding) = service();
        assert_eq!(rag.build(&[]).await.unwrap(), BuildOutcome::Placeholder);
        assert_eq!(embedding.calls(), 0);
        assert!(rag.exists().await.unwrap());

        let results = rag.retrieve_top_k("vacation", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].chunk.is_placeholder());
        assert_eq!(results[0].score, 0.0);
    }
}
