use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::domain::ports::{Capability, CompletionProvider};
use crate::domain::{DomainError, Language, SearchResult};

const NO_PROVIDER_MESSAGE: &str =
    "No model configured. Please set OPENAI_MODEL or configure llm.candidates.";

/// Result of one synthesis attempt. `error` is set whenever `text` is the
/// static fallback because no provider answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub text: String,
    pub model: Option<String>,
    pub error: Option<String>,
}

impl Synthesis {
    pub fn is_fallback(&self) -> bool {
        self.model.is_none()
    }
}

/// Turns retrieved excerpts and a question into an answer, trying completion
/// providers in order until one succeeds.
pub struct AnswerSynthesizer {
    providers: Vec<Arc<dyn CompletionProvider>>,
    required: Vec<Capability>,
    system_prompt: String,
    support_contact: String,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(
        providers: Vec<Arc<dyn CompletionProvider>>,
        system_prompt: impl Into<String>,
        support_contact: impl Into<String>,
    ) -> Self {
        Self {
            providers,
            required: vec![Capability::Chat],
            system_prompt: system_prompt.into(),
            support_contact: support_contact.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_required_capabilities(mut self, required: Vec<Capability>) -> Self {
        self.required = required;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn support_contact(&self) -> &str {
        &self.support_contact
    }

    fn eligible(&self) -> impl Iterator<Item = &Arc<dyn CompletionProvider>> {
        self.providers.iter().filter(|p| {
            let ok = self.required.iter().all(|c| p.supports(*c));
            if !ok {
                tracing::debug!(
                    provider = p.provider(),
                    model = p.model(),
                    "skipping provider without required capabilities"
                );
            }
            ok
        })
    }

    #[instrument(skip(self, question, excerpts), fields(language = %language, excerpts = excerpts.len()))]
    pub async fn synthesize(
        &self,
        question: &str,
        excerpts: &[SearchResult],
        language: Language,
    ) -> Synthesis {
        let prompt = self.build_prompt(question, excerpts, language);
        let mut last_error: Option<String> = None;
        let mut attempted = false;

        for provider in self.eligible() {
            attempted = true;
            let call = provider.complete_with_system(&self.system_prompt, &prompt);
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(text)) => {
                    tracing::info!(provider = provider.provider(), model = provider.model(), "answer synthesized");
                    return Synthesis {
                        text,
                        model: Some(provider.model().to_string()),
                        error: None,
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(model = provider.model(), error = %e, "model call failed, trying next candidate");
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(model = provider.model(), timeout = ?self.timeout, "model call timed out, trying next candidate");
                    let error = DomainError::timeout(format!(
                        "{} timed out after {:?}",
                        provider.model(),
                        self.timeout
                    ));
                    last_error = Some(error.to_string());
                }
            }
        }

        let error = match (attempted, last_error) {
            (false, _) => NO_PROVIDER_MESSAGE.to_string(),
            (true, Some(e)) => format!("Model call failed. {e}"),
            (true, None) => "Model call failed.".to_string(),
        };
        Synthesis {
            text: language.fallback_message(&self.support_contact),
            model: None,
            error: Some(error),
        }
    }

    pub fn build_prompt(
        &self,
        question: &str,
        excerpts: &[SearchResult],
        language: Language,
    ) -> String {
        format!(
            "Using the provided context excerpts, answer the user's question.\n\
             - Be concise, polite, and professional.\n\
             - If the context is insufficient to answer confidently, say you are not fully sure \
             and suggest contacting HR at {contact}.\n\
             - Respond in {language} appropriate for Switzerland.\n\n\
             {context}\n\n\
             User question: {question}",
            contact = self.support_contact,
            language = language.display_name(),
            context = format_context_block(excerpts),
        )
    }
}

/// Numbered excerpts, each tagged with the file it came from.
pub fn format_context_block(excerpts: &[SearchResult]) -> String {
    let usable: Vec<&SearchResult> = excerpts
        .iter()
        .filter(|r| !r.chunk.is_placeholder())
        .collect();
    if usable.is_empty() {
        return String::new();
    }

    let mut blocks = vec!["Context (top relevant excerpts):".to_string()];
    for (i, result) in usable.iter().enumerate() {
        blocks.push(format!(
            "[{}] Source: {}\n{}",
            i + 1,
            result.chunk.source_name(),
            result.chunk.content.trim()
        ));
    }
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentChunk;
    use crate::test_support::{Script, ScriptedProvider};

    fn excerpts() -> Vec<SearchResult> {
        vec![
            SearchResult {
                chunk: DocumentChunk::new("docs/hr_policy.txt", "  Vacation: 25 days.\n", 0),
                score: 0.8,
            },
            SearchResult {
                chunk: DocumentChunk::new("docs/it_policy.txt", "VPN required.", 2),
                score: 0.4,
            },
        ]
    }

    fn synthesizer(providers: Vec<Arc<dyn CompletionProvider>>) -> AnswerSynthesizer {
        AnswerSynthesizer::new(providers, "system", "hr@company.ch")
    }

    #[test]
    fn test_context_block_format() {
        assert_eq!(
            format_context_block(&excerpts()),
            "Context (top relevant excerpts):\n\n\
             [1] Source: hr_policy.txt\nVacation: 25 days.\n\n\
             [2] Source: it_policy.txt\nVPN required."
        );
        assert_eq!(format_context_block(&[]), "");
    }

    #[test]
    fn test_prompt_names_language_and_question() {
        let prompt = synthesizer(vec![]).build_prompt(
            "Combien de jours de vacances?",
            &excerpts(),
            Language::Fr,
        );
        assert!(prompt.starts_with("Using the provided context excerpts"));
        assert!(prompt.contains("Respond in French (Swiss professional tone) appropriate for Switzerland."));
        assert!(prompt.contains("contacting HR at hr@company.ch"));
        assert!(prompt.contains("[1] Source: hr_policy.txt"));
        assert!(prompt.ends_with("User question: Combien de jours de vacances?"));
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let first = ScriptedProvider::replying("m1", "You get 25 days.");
        let second = ScriptedProvider::replying("m2", "unused");
        let synthesis = synthesizer(vec![first.clone(), second.clone()])
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;

        assert_eq!(synthesis.text, "You get 25 days.");
        assert_eq!(synthesis.model.as_deref(), Some("m1"));
        assert_eq!(synthesis.error, None);
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_failed_candidates() {
        let first = ScriptedProvider::failing("m1", "model not found");
        let second = ScriptedProvider::replying("m2", "Answer from m2");
        let synthesis = synthesizer(vec![first.clone(), second.clone()])
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;

        assert_eq!(synthesis.model.as_deref(), Some("m2"));
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 1);
        assert_eq!(first.last_prompt(), second.last_prompt());
    }

    #[tokio::test]
    async fn test_all_failing_returns_fallback_with_error() {
        let first = ScriptedProvider::failing("m1", "rate limited");
        let second = ScriptedProvider::failing("m2", "quota exceeded");
        let synthesis = synthesizer(vec![first.clone(), second.clone()])
            .synthesize("Wie viele Ferientage?", &excerpts(), Language::De)
            .await;

        assert!(synthesis.is_fallback());
        assert_eq!(synthesis.text, Language::De.fallback_message("hr@company.ch"));
        let error = synthesis.error.unwrap();
        assert!(error.starts_with("Model call failed."));
        assert!(error.contains("quota exceeded"));
        assert_eq!(first.call_count() + second.call_count(), 2);
    }

    #[tokio::test]
    async fn test_no_providers_reports_configuration() {
        let synthesis = synthesizer(vec![])
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;
        assert!(synthesis.is_fallback());
        assert_eq!(synthesis.error.as_deref(), Some(NO_PROVIDER_MESSAGE));
    }

    #[tokio::test]
    async fn test_provider_without_required_capability_is_skipped() {
        let short = ScriptedProvider::with_capabilities(
            "short",
            Script::Reply("short".into()),
            vec![Capability::Chat],
        );
        let long = ScriptedProvider::with_capabilities(
            "long",
            Script::Reply("long".into()),
            vec![Capability::Chat, Capability::LongContext],
        );
        let synthesis = synthesizer(vec![short.clone(), long.clone()])
            .with_required_capabilities(vec![Capability::Chat, Capability::LongContext])
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;

        assert_eq!(synthesis.text, "long");
        assert_eq!(short.call_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_moves_to_next_candidate() {
        let slow = ScriptedProvider::new("slow", Script::Hang);
        let fast = ScriptedProvider::replying("fast", "quick answer");
        let synthesis = synthesizer(vec![slow.clone(), fast.clone()])
            .with_timeout(Duration::from_millis(50))
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;

        assert_eq!(synthesis.model.as_deref(), Some("fast"));
        assert_eq!(slow.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_reported_when_no_candidate_answers() {
        let slow = ScriptedProvider::new("slow", Script::Hang);
        let synthesis = synthesizer(vec![slow])
            .with_timeout(Duration::from_millis(50))
            .synthesize("vacation?", &excerpts(), Language::En)
            .await;

        assert!(synthesis.is_fallback());
        assert_eq!(
            synthesis.error.as_deref(),
            Some("Model call failed. Timed out: slow timed out after 50ms")
        );
    }
}
