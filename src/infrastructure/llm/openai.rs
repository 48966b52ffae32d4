use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::ports::{Capability, CompletionProvider};
use crate::domain::DomainError;
use crate::infrastructure::config::{require_key, OPENAI_API_KEY_ENV};

pub struct OpenAiLlm {
    model: String,
    temperature: f64,
    capabilities: Vec<Capability>,
}

impl OpenAiLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            capabilities: vec![Capability::Chat, Capability::Multilingual],
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiLlm {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        require_key(OPENAI_API_KEY_ENV)?;
        let client = openai::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system)
            .temperature(self.temperature)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(e.to_string()))
    }
}
