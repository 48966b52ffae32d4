use std::fmt;
use std::sync::Arc;
use tracing::instrument;

use super::{AnswerSynthesizer, BuildOutcome, DocumentService, GateDecision, RagService, RelevanceGate};
use crate::domain::{Conversation, IngestStatus, Language, MessageRole};

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "OPENAI_API_KEY is not set. Load from .env or environment to enable answers.";
pub const INDEX_NOT_READY_MESSAGE: &str = "Vector store not ready. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Something the user should see besides the reply itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// How a turn was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRoute {
    SmallTalk,
    Unconfigured,
    IndexUnavailable,
    RetrievalFailed,
    LowRelevance,
    Answered,
    SynthesisFailed,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub language: Language,
    pub route: TurnRoute,
    pub reply: Option<String>,
    pub notices: Vec<Notice>,
    pub best_score: Option<f32>,
    pub model: Option<String>,
}

impl TurnOutcome {
    fn new(language: Language, route: TurnRoute, reply: Option<String>) -> Self {
        Self {
            language,
            route,
            reply,
            notices: Vec::new(),
            best_score: None,
            model: None,
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

/// Answers one user turn at a time against a prepared index.
pub struct Assistant {
    documents: DocumentService,
    rag: Arc<RagService>,
    gate: RelevanceGate,
    synthesizer: AnswerSynthesizer,
    has_credential: bool,
    index_ready: bool,
}

impl Assistant {
    pub fn new(
        documents: DocumentService,
        rag: Arc<RagService>,
        gate: RelevanceGate,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            documents,
            rag,
            gate,
            synthesizer,
            has_credential: true,
            index_ready: false,
        }
    }

    /// Without a credential no remote call is ever attempted.
    pub fn with_credential(mut self, present: bool) -> Self {
        self.has_credential = present;
        self
    }

    pub fn is_index_ready(&self) -> bool {
        self.index_ready
    }

    /// Startup: reports a missing credential, then makes sure an index exists.
    /// Never fails; problems come back as notices.
    #[instrument(skip(self))]
    pub async fn prepare(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if !self.has_credential {
            notices.push(Notice::warning(MISSING_CREDENTIAL_MESSAGE));
        }
        notices.extend(self.ensure_index().await);
        notices
    }

    /// Reuses a persisted index, otherwise ingests the documents and builds
    /// one. Called at startup and again by every turn while the index is
    /// missing, so a failed build is retried.
    async fn ensure_index(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();

        match self.rag.exists().await {
            Ok(true) => {
                self.index_ready = true;
                return notices;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, "cannot inspect vector store");
                notices.push(Notice::error(format!("Vector store check failed: {e}")));
                return notices;
            }
        }

        if !self.has_credential {
            return notices;
        }

        match self.documents.ingest().await {
            Ok((report, chunks)) => {
                let skipped: Vec<String> = report
                    .skipped()
                    .map(|o| match &o.status {
                        IngestStatus::Skipped { reason } => format!("{} ({reason})", o.path.display()),
                        IngestStatus::Loaded { .. } => o.path.display().to_string(),
                    })
                    .collect();
                if !skipped.is_empty() {
                    notices.push(Notice::info(format!(
                        "Skipped {} document(s): {}",
                        skipped.len(),
                        skipped.join(", ")
                    )));
                }

                match self.rag.build(&chunks).await {
                    Ok(BuildOutcome::Built { entries }) => notices.push(Notice::info(format!(
                        "Indexed {entries} excerpt(s) from {} document(s).",
                        report.loaded_count()
                    ))),
                    Ok(BuildOutcome::Placeholder) => notices.push(Notice::info(
                        "No documents found; the knowledge base is empty.",
                    )),
                    Ok(BuildOutcome::AlreadyPresent) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "index build failed");
                        notices.push(Notice::info(format!("Index build pending: {e}")));
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "document ingestion failed");
                notices.push(Notice::info(format!("Index build pending: {e}")));
            }
        }

        self.index_ready = self.rag.exists().await.unwrap_or(false);
        notices
    }

    /// Runs one turn, recording the question and any reply in `session`.
    #[instrument(skip(self, session, input), fields(session = %session.id))]
    pub async fn respond(&mut self, session: &mut Conversation, input: &str) -> TurnOutcome {
        session.add_message(MessageRole::User, input);

        let outcome = self.run_turn(input).await;
        tracing::info!(route = ?outcome.route, language = %outcome.language, "turn resolved");

        if let Some(reply) = &outcome.reply {
            session.add_message(MessageRole::Assistant, reply.clone());
        }
        outcome
    }

    async fn run_turn(&mut self, input: &str) -> TurnOutcome {
        let language = Language::detect(input);

        if let Some(canned) = language.small_talk_reply(input) {
            return TurnOutcome::new(language, TurnRoute::SmallTalk, Some(canned.to_string()));
        }

        let fallback = language.fallback_message(self.synthesizer.support_contact());
        if !self.has_credential {
            return TurnOutcome::new(language, TurnRoute::Unconfigured, Some(fallback))
                .with_notice(Notice::warning(MISSING_CREDENTIAL_MESSAGE));
        }

        let mut notices = Vec::new();
        if !self.index_ready {
            notices = self.ensure_index().await;
            if !self.index_ready {
                notices.push(Notice::error(INDEX_NOT_READY_MESSAGE));
                let mut outcome = TurnOutcome::new(language, TurnRoute::IndexUnavailable, None);
                outcome.notices = notices;
                return outcome;
            }
        }

        let mut outcome = self.answer(input, language, fallback).await;
        notices.append(&mut outcome.notices);
        outcome.notices = notices;
        outcome
    }

    /// Retrieval, relevance gate and synthesis against a ready index.
    async fn answer(&self, input: &str, language: Language, fallback: String) -> TurnOutcome {
        let results = match self.rag.retrieve(input).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed");
                return TurnOutcome::new(language, TurnRoute::RetrievalFailed, None)
                    .with_notice(Notice::error(format!("Retrieval error: {e}")));
            }
        };

        let best_score = match self.gate.check(&results) {
            GateDecision::Reject { best_score } => {
                tracing::info!(best_score, threshold = self.gate.threshold(), "below relevance threshold");
                let mut outcome =
                    TurnOutcome::new(language, TurnRoute::LowRelevance, Some(fallback));
                outcome.best_score = Some(best_score);
                return outcome;
            }
            GateDecision::Pass { best_score } => best_score,
        };

        let synthesis = self.synthesizer.synthesize(input, &results, language).await;
        let route = if synthesis.is_fallback() {
            TurnRoute::SynthesisFailed
        } else {
            TurnRoute::Answered
        };

        let mut outcome = TurnOutcome::new(language, route, Some(synthesis.text));
        outcome.best_score = Some(best_score);
        outcome.model = synthesis.model;
        if let Some(error) = synthesis.error {
            outcome = outcome.with_notice(Notice::error(error));
        }
        outcome
    }
}
