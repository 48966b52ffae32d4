use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::Embedding;

/// Raw text of one source file, alive only until it has been chunked.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
}

impl DocumentChunk {
    pub fn new(source: impl Into<String>, content: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            content: content.into(),
            chunk_index,
        }
    }

    /// Stand-in stored when the corpus is empty so that searching a freshly
    /// built index never fails for lack of entries.
    pub fn placeholder() -> Self {
        Self::new("", "", 0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.source.is_empty() && self.content.is_empty()
    }

    /// File name of the source, which is what the prompt cites.
    pub fn source_name(&self) -> &str {
        Path::new(&self.source)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(if self.source.is_empty() {
                "unknown"
            } else {
                &self.source
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// A chunk together with its vector, as persisted by the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Embedding,
}

impl IndexEntry {
    pub fn new(chunk: DocumentChunk, embedding: Embedding) -> Self {
        Self { chunk, embedding }
    }

    pub fn placeholder() -> Self {
        Self::new(DocumentChunk::placeholder(), Embedding::empty())
    }
}

/// Per-file result of reading the documents directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub path: PathBuf,
    pub status: IngestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    Loaded { chars: usize, lossy: bool },
    Skipped { reason: String },
}

impl IngestOutcome {
    pub fn loaded(path: impl Into<PathBuf>, chars: usize, lossy: bool) -> Self {
        Self {
            path: path.into(),
            status: IngestStatus::Loaded { chars, lossy },
        }
    }

    pub fn skipped(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: IngestStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, IngestStatus::Loaded { .. })
    }
}

/// Documents read from a source plus what happened to every file.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub documents: Vec<Document>,
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    pub fn loaded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_loaded()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &IngestOutcome> {
        self.outcomes.iter().filter(|o| !o.is_loaded())
    }
}
