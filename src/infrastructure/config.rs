use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::domain::ports::Capability;
use crate::domain::DomainError;

pub const CONFIG_PATH_ENV: &str = "ASSISTANT_CONFIG";
pub const DOCS_DIR_ENV: &str = "ASSISTANT_DOCS_DIR";
pub const PERSIST_DIR_ENV: &str = "ASSISTANT_PERSIST_DIR";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_CONFIG_FILE: &str = "assistant.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub documents: DocumentsConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub prompts: PromptsConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    pub persist_dir: PathBuf,
    pub top_k: usize,
    pub relevance_threshold: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub temperature: f64,
    pub timeout_seconds: u64,
    pub required_capabilities: Vec<Capability>,
    pub candidates: Vec<CandidateConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CandidateConfig {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub system: String,
    pub support_contact: String,
}

/// Secrets picked up from the environment, never from the config file.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn default_capabilities() -> Vec<Capability> {
    vec![Capability::Chat]
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("docs"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from(".vector_store"),
            top_k: 3,
            relevance_threshold: 0.2,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 64,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let chat = vec![Capability::Chat, Capability::Multilingual];
        Self {
            temperature: 0.2,
            timeout_seconds: 60,
            required_capabilities: vec![Capability::Chat],
            candidates: ["gpt-5-nano", "gpt-5-mini", "gpt-4o-mini"]
                .into_iter()
                .map(|model| CandidateConfig {
                    provider: ProviderKind::OpenAi,
                    model: model.to_string(),
                    capabilities: chat.clone(),
                })
                .collect(),
        }
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system: "You are Swiss AI Office Assistant, an internal HR bot for employees.\n\
                     Answer clearly, politely, and in a professional corporate tone.\n\
                     If you're unsure, say so and suggest contacting HR."
                .to_string(),
            support_contact: "hr@company.ch".to_string(),
        }
    }
}

/// rig's `from_env` constructors panic when the key is missing, so callers
/// check first and get a configuration error instead.
pub(crate) fn require_key(var: &str) -> Result<(), DomainError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(DomainError::configuration(format!("{var} is not set"))),
    }
}

impl AppConfig {
    /// Defaults, overlaid by the YAML file named in `ASSISTANT_CONFIG` (or
    /// `assistant.yaml` when present), overlaid by the environment.
    pub fn load() -> Result<Self, DomainError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw).map_err(|e| DomainError::configuration(e.to_string()))
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.credentials.openai_api_key = non_empty(OPENAI_API_KEY_ENV);

        if let Some(model) = non_empty(OPENAI_MODEL_ENV) {
            if self.llm.candidates.is_empty() {
                self.llm.candidates.push(CandidateConfig {
                    provider: ProviderKind::OpenAi,
                    model,
                    capabilities: default_capabilities(),
                });
            } else {
                self.llm.candidates[0].model = model;
            }
        }
        if let Some(dir) = non_empty(DOCS_DIR_ENV) {
            self.documents.dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty(PERSIST_DIR_ENV) {
            self.index.persist_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.documents.chunk_size == 0 {
            return Err(DomainError::validation("documents.chunk_size must be > 0"));
        }
        if self.documents.chunk_overlap >= self.documents.chunk_size {
            return Err(DomainError::validation(
                "documents.chunk_overlap must be smaller than documents.chunk_size",
            ));
        }
        if self.index.top_k == 0 {
            return Err(DomainError::validation("index.top_k must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.index.relevance_threshold) {
            return Err(DomainError::validation(
                "index.relevance_threshold must be within [0, 1]",
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(DomainError::validation("embedding.batch_size must be > 0"));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(DomainError::validation("llm.timeout_seconds must be > 0"));
        }
        Ok(())
    }
}
