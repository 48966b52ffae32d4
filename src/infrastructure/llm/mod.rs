mod anthropic;
mod openai;

use std::sync::Arc;

pub use anthropic::AnthropicLlm;
pub use openai::OpenAiLlm;

use crate::domain::ports::CompletionProvider;
use crate::infrastructure::config::{LlmConfig, ProviderKind};

/// Providers in the configured candidate order.
pub fn providers_from_config(config: &LlmConfig) -> Vec<Arc<dyn CompletionProvider>> {
    config
        .candidates
        .iter()
        .filter(|c| !c.model.trim().is_empty())
        .map(|c| -> Arc<dyn CompletionProvider> {
            match c.provider {
                ProviderKind::OpenAi => Arc::new(
                    OpenAiLlm::new(&c.model)
                        .with_temperature(config.temperature)
                        .with_capabilities(c.capabilities.clone()),
                ),
                ProviderKind::Anthropic => Arc::new(
                    AnthropicLlm::new(&c.model)
                        .with_temperature(config.temperature)
                        .with_capabilities(c.capabilities.clone()),
                ),
            }
        })
        .collect()
}
