//! AI provider integrations

mod ollama;
mod openai_compat;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, LlmConfig};

pub use ollama::OllamaProvider;
pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A chat-completion message as sent to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

pub enum Provider {
    Ollama(OllamaProvider),
    OpenAICompat(OpenAICompatProvider),
}

impl Provider {
    /// Build the provider named in the site's `[llm]` section
    pub fn from_llm_config(llm: &LlmConfig, config: &Config) -> Result<Self, ProviderError> {
        let api_key = llm
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());

        match llm.provider.to_lowercase().as_str() {
            "ollama" => {
                let url = llm
                    .endpoint
                    .clone()
                    .or_else(|| config.ollama_url.clone())
                    .unwrap_or_else(|| "http://localhost:11434".into());
                Ok(Provider::Ollama(OllamaProvider::new(url)))
            }
            "openai" => {
                let key = api_key
                    .or_else(|| config.openai_api_key.clone())
                    .ok_or_else(|| ProviderError::NotConfigured("openai: missing API key".into()))?;
                let mut compat = OpenAICompatConfig::openai(key);
                if let Some(ref endpoint) = llm.endpoint {
                    compat.base_url = endpoint.clone();
                }
                Ok(Provider::OpenAICompat(OpenAICompatProvider::new(compat)?))
            }
            "groq" => {
                let key = api_key
                    .or_else(|| config.groq_api_key.clone())
                    .ok_or_else(|| ProviderError::NotConfigured("groq: missing API key".into()))?;
                Ok(Provider::OpenAICompat(OpenAICompatProvider::new(
                    OpenAICompatConfig::groq(key),
                )?))
            }
            "local" => {
                let endpoint = llm
                    .endpoint
                    .clone()
                    .ok_or_else(|| ProviderError::NotConfigured("local: missing endpoint".into()))?;
                let mut compat = OpenAICompatConfig::local(endpoint, llm.model.clone());
                compat.api_key = api_key;
                Ok(Provider::OpenAICompat(OpenAICompatProvider::new(compat)?))
            }
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama(_) => "ollama",
            Provider::OpenAICompat(_) => "openai-compatible",
        }
    }

    /// Send messages and return the assistant's text, `None` when the
    /// provider produced no content
    pub async fn chat(&self, messages: &[Message], model: &str) -> Result<Option<String>, ProviderError> {
        match self {
            Provider::Ollama(p) => p.chat(messages, model).await,
            Provider::OpenAICompat(p) => p.chat(messages, model).await,
        }
    }
}
