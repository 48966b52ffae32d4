mod conversation;
mod document;
mod embedding;
mod language;

pub use conversation::{Conversation, Message, MessageRole};
pub use document::{
    Document, DocumentChunk, IndexEntry, IngestOutcome, IngestReport, IngestStatus, SearchResult,
};
pub use embedding::Embedding;
pub use language::Language;
