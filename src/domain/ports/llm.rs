use crate::domain::errors::DomainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a completion provider can be trusted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    Multilingual,
    LongContext,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider family, e.g. `openai`.
    fn provider(&self) -> &str;
    fn model(&self) -> &str;
    fn capabilities(&self) -> &[Capability];

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    async fn complete_with_system(&self, system: &str, prompt: &str)
        -> Result<String, DomainError>;
}
