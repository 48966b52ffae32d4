use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;
use std::collections::HashMap;
use tracing::instrument;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::{require_key, EmbeddingConfig, OPENAI_API_KEY_ENV};

/// OpenAI embeddings through rig.
pub struct TextEmbedding {
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl TextEmbedding {
    pub fn new() -> Self {
        Self::from_config(&EmbeddingConfig::default())
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn client() -> Result<openai::Client, DomainError> {
        require_key(OPENAI_API_KEY_ENV)?;
        Ok(openai::Client::from_env())
    }

    async fn embed_batch(
        &self,
        client: &openai::Client,
        texts: &[String],
    ) -> Result<Vec<Embedding>, DomainError> {
        let model = client.embedding_model(&self.model);

        let mut builder = EmbeddingsBuilder::new(model);
        for text in texts {
            builder = builder
                .document(text.clone())
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let embeddings = builder
            .build()
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        let vectors = embeddings.into_iter().map(|(doc, emb)| {
            let vec_f32: Vec<f32> = emb.first().vec.into_iter().map(|x| x as f32).collect();
            (doc, vec_f32)
        });
        align_to_inputs(texts, vectors)
    }
}

/// Puts vectors returned by the builder back in input order. The builder may
/// reorder documents, so they are keyed by text; duplicate texts share one
/// vector.
fn align_to_inputs(
    texts: &[String],
    embedded: impl IntoIterator<Item = (String, Vec<f32>)>,
) -> Result<Vec<Embedding>, DomainError> {
    let by_text: HashMap<String, Vec<f32>> = embedded.into_iter().collect();

    texts
        .iter()
        .map(|text| {
            by_text
                .get(text)
                .cloned()
                .map(Embedding::new)
                .ok_or_else(|| DomainError::internal("No embedding returned"))
        })
        .collect()
}

impl Default for TextEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed_query(&self, text: &str) -> Result<Embedding, DomainError> {
        let client = Self::client()?;
        self.embed_batch(&client, &[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    #[instrument(skip(self, texts), fields(model = %self.model, count = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = Self::client()?;
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(&client, batch).await?);
            tracing::debug!(embedded = vectors.len(), total = texts.len(), "embedding batch done");
        }

        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
