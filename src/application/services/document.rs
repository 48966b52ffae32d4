use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::DocumentSource, DocumentChunk, DomainError, IngestReport, TextSplitter,
};

/// Reads the corpus and cuts it into retrieval chunks.
pub struct DocumentService {
    source: Arc<dyn DocumentSource>,
    splitter: TextSplitter,
}

impl DocumentService {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            splitter: TextSplitter::default(),
        }
    }

    pub fn with_splitter(source: Arc<dyn DocumentSource>, splitter: TextSplitter) -> Self {
        Self { source, splitter }
    }

    #[instrument(skip(self))]
    pub async fn ingest(&self) -> Result<(IngestReport, Vec<DocumentChunk>), DomainError> {
        let report = self.source.load().await?;
        let chunks = self.splitter.split_documents(&report.documents);
        tracing::info!(
            documents = report.documents.len(),
            chunks = chunks.len(),
            "documents chunked"
        );
        Ok((report, chunks))
    }
}
