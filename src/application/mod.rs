//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations; `Assistant` ties them together into one chat turn.

pub mod services;

pub use services::{
    AnswerSynthesizer, Assistant, DocumentService, Notice, NoticeLevel, RagService,
    RelevanceGate, TurnOutcome, TurnRoute,
};
