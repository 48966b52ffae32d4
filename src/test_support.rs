//! Port fakes shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::ports::{
    Capability, CompletionProvider, DocumentSource, EmbeddingService, VectorStore,
};
use crate::domain::{
    Document, DomainError, Embedding, IndexEntry, IngestOutcome, IngestReport, SearchResult,
};
use crate::infrastructure::InMemoryVectorStore;

const VOCABULARY: [&str; 8] = [
    "vacation", "days", "vpn", "laptop", "sick", "leave", "badge", "parking",
];

/// Bag-of-words over a tiny vocabulary; text without any of the words maps
/// to the zero vector and therefore scores 0 against everything.
#[derive(Default)]
pub struct FakeEmbedding {
    pub query_calls: AtomicUsize,
    pub document_calls: AtomicUsize,
}

impl FakeEmbedding {
    pub fn vector(text: &str) -> Embedding {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        Embedding::new(
            VOCABULARY
                .iter()
                .map(|v| words.iter().filter(|w| *w == v).count() as f32)
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst) + self.document_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingService for FakeEmbedding {
    async fn embed_query(&self, text: &str) -> Result<Embedding, DomainError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model(&self) -> &str {
        "fake-embedding"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }
}

/// Store whose search always fails.
pub struct BrokenStore;

#[async_trait]
impl VectorStore for BrokenStore {
    async fn exists(&self) -> Result<bool, DomainError> {
        Ok(true)
    }

    async fn persist(&self, _entries: &[IndexEntry]) -> Result<(), DomainError> {
        Err(DomainError::internal("read-only"))
    }

    async fn search(
        &self,
        _query: &Embedding,
        _top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        Err(DomainError::external("store unreachable"))
    }
}

/// In-memory store whose first `failures` persists are refused as if
/// another build held the lock.
pub struct FlakyStore {
    inner: InMemoryVectorStore,
    failures: AtomicUsize,
    pub persist_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            failures: AtomicUsize::new(failures),
            persist_calls: AtomicUsize::new(0),
        }
    }

    pub fn persist_count(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for FlakyStore {
    async fn exists(&self) -> Result<bool, DomainError> {
        self.inner.exists().await
    }

    async fn persist(&self, entries: &[IndexEntry]) -> Result<(), DomainError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(DomainError::conflict("index build already in progress"));
        }
        self.inner.persist(entries).await
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.inner.search(query, top_k).await
    }
}

/// Fixed set of documents plus pre-baked skip outcomes.
#[derive(Default)]
pub struct StaticSource {
    pub documents: Vec<Document>,
    pub skipped: Vec<IngestOutcome>,
}

impl StaticSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            skipped: Vec::new(),
        }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load(&self) -> Result<IngestReport, DomainError> {
        let mut outcomes: Vec<IngestOutcome> = self
            .documents
            .iter()
            .map(|d| IngestOutcome::loaded(&d.source, d.text.chars().count(), false))
            .collect();
        outcomes.extend(self.skipped.iter().cloned());
        Ok(IngestReport {
            documents: self.documents.clone(),
            outcomes,
        })
    }
}

#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(String),
    Hang,
}

/// Completion provider that plays back a fixed behaviour and records prompts.
pub struct ScriptedProvider {
    model: String,
    script: Script,
    capabilities: Vec<Capability>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(model: &str, script: Script) -> Arc<Self> {
        Self::with_capabilities(model, script, vec![Capability::Chat])
    }

    pub fn replying(model: &str, reply: &str) -> Arc<Self> {
        Self::new(model, Script::Reply(reply.to_string()))
    }

    pub fn failing(model: &str, error: &str) -> Arc<Self> {
        Self::new(model, Script::Fail(error.to_string()))
    }

    pub fn with_capabilities(
        model: &str,
        script: Script,
        capabilities: Vec<Capability>,
    ) -> Arc<Self> {
        Arc::new(Self {
            model: model.to_string(),
            script,
            capabilities,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn complete_with_system(
        &self,
        _system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(error) => Err(DomainError::external(error.clone())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}
