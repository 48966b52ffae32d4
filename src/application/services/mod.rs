mod assistant;
mod document;
mod rag;
mod relevance;
mod synthesis;

pub use assistant::{
    Assistant, Notice, NoticeLevel, TurnOutcome, TurnRoute, INDEX_NOT_READY_MESSAGE,
    MISSING_CREDENTIAL_MESSAGE,
};
pub use document::DocumentService;
pub use rag::{BuildOutcome, RagService};
pub use relevance::{GateDecision, RelevanceGate, DEFAULT_RELEVANCE_THRESHOLD};
pub use synthesis::{format_context_block, AnswerSynthesizer, Synthesis};
