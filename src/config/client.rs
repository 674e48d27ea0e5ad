//! Site configuration loaded from TOML files
//!
//! Each deployed widget has a site configuration that defines:
//! - The page content the widget answers questions about
//! - LLM provider configuration
//! - Where the auxiliary knowledge file lives
//! - An optional directory of prompt template overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Content used when no site file supplies any
pub const DEFAULT_SITE_CONTENT: &str = r#"
  Welcome to Acme Corp!

  We are a leading provider of innovative solutions for businesses of all sizes. Our mission is to help our clients succeed by providing them with the tools and resources they need to grow and thrive.

  Our services include:

  - Consulting
  - Training
  - Support

  Contact us today to learn more about how we can help you achieve your business goals.
"#;

/// Root site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site information and page content
    #[serde(default)]
    pub site: SiteInfo,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge file settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Prompt template overrides
    #[serde(default)]
    pub prompts: PromptsConfig,
}

impl SiteConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to the built-in defaults when the file
    /// does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Site config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.site.content.is_some() && self.site.content_file.is_some() {
            return Err(ConfigError::Validation(
                "site.content and site.content_file are mutually exclusive".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".into()));
        }
        Ok(())
    }

    /// The page content the widget is about, read once at startup
    pub fn site_content(&self) -> Result<String, ConfigError> {
        match (&self.site.content, &self.site.content_file) {
            (Some(content), _) => Ok(content.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
            (None, None) => Ok(DEFAULT_SITE_CONTENT.to_string()),
        }
    }
}

/// Site identification and content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Display name shown in the widget header
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Inline page content
    #[serde(default)]
    pub content: Option<String>,

    /// File holding the page content
    #[serde(default)]
    pub content_file: Option<PathBuf>,
}

fn default_site_name() -> String {
    "Gradiator Chatbot".to_string()
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            content: None,
            content_file: None,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "ollama", "openai", "groq", "local"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API key environment variable name (for cloud providers)
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Custom API endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: None,
            endpoint: None,
        }
    }
}

/// Knowledge file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Plain-text file merged into the site content on every answer
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/knowledge-base.txt")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// Directory holding `summarize.toml` / `answer.toml` overrides
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
