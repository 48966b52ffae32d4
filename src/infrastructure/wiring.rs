use std::sync::Arc;
use std::time::Duration;

use super::config::AppConfig;
use super::{providers_from_config, DirectoryLoader, LocalVectorStore, TextEmbedding};
use crate::application::services::{
    AnswerSynthesizer, Assistant, DocumentService, RagService, RelevanceGate,
};
use crate::domain::{DomainError, TextSplitter};

/// Builds the assistant from configuration with the local adapters: the
/// documents directory, the on-disk index and the configured model chain.
pub fn assistant_from_config(config: &AppConfig) -> Result<Assistant, DomainError> {
    let splitter = TextSplitter::new(
        config.documents.chunk_size,
        config.documents.chunk_overlap,
    )?;
    let documents = DocumentService::with_splitter(
        Arc::new(DirectoryLoader::new(&config.documents.dir)),
        splitter,
    );

    let embedding = TextEmbedding::from_config(&config.embedding);
    let store = LocalVectorStore::new(&config.index.persist_dir, &config.embedding.model);
    let rag = Arc::new(RagService::new(
        Arc::new(embedding),
        Arc::new(store),
        config.index.top_k,
    ));

    let synthesizer = AnswerSynthesizer::new(
        providers_from_config(&config.llm),
        &config.prompts.system,
        &config.prompts.support_contact,
    )
    .with_required_capabilities(config.llm.required_capabilities.clone())
    .with_timeout(Duration::from_secs(config.llm.timeout_seconds));

    tracing::debug!(
        docs = %config.documents.dir.display(),
        persist = %config.index.persist_dir.display(),
        candidates = config.llm.candidates.len(),
        "assistant wired"
    );

    Ok(Assistant::new(
        documents,
        rag,
        RelevanceGate::new(config.index.relevance_threshold),
        synthesizer,
    )
    .with_credential(config.credentials.has_openai()))
}
