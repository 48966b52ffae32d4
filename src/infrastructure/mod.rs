pub mod config;
pub mod embedding;
pub mod llm;
pub mod loader;
pub mod vector_store;
mod wiring;

pub use config::{AppConfig, Credentials, LlmConfig, PromptsConfig, ProviderKind};
pub use embedding::TextEmbedding;
pub use llm::{providers_from_config, AnthropicLlm, OpenAiLlm};
pub use loader::DirectoryLoader;
pub use vector_store::{InMemoryVectorStore, LocalVectorStore};
pub use wiring::assistant_from_config;
