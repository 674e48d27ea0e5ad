//! Application configuration

pub mod client;
pub mod prompts;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use client::{LlmConfig, SiteConfig};
pub use prompts::{PromptManager, TemplateId};

/// Process-level settings read from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub ollama_url: Option<String>,
    /// Path to the site TOML file
    pub site_config_path: PathBuf,
    /// Sessions untouched for this long are evicted
    pub session_idle_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            groq_api_key: env::var("GROQ_API_KEY").ok(),
            ollama_url: env::var("OLLAMA_URL").ok(),
            site_config_path: env::var("SITECHAT_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("sitechat.toml")),
            session_idle_secs: env::var("SITECHAT_SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
        })
    }

    /// Idle timeout as a duration, clamped to the largest representable one
    pub fn session_idle_timeout(&self) -> chrono::Duration {
        i64::try_from(self.session_idle_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
