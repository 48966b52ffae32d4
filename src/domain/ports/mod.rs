mod document_source;
mod embedding;
mod llm;
mod vector_store;

pub use document_source::DocumentSource;
pub use embedding::EmbeddingService;
pub use llm::{Capability, CompletionProvider};
pub use vector_store::VectorStore;
