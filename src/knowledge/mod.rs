//! Site content and the auxiliary knowledge file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The page content the widget answers questions about. Injected once at
/// startup and shared read-only.
#[derive(Debug, Clone)]
pub struct SiteContent(Arc<str>);

impl SiteContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self(Arc::from(content.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Knowledge text stored on disk. Never cached: every call to `load` hits
/// the file so edits show up on the next answer.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    path: PathBuf,
}

impl KnowledgeBase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<String, KnowledgeError> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|source| KnowledgeError::Read {
                path: self.path.clone(),
                source,
            })
    }
}

/// Knowledge text, one space, then page content
pub fn combine(knowledge: &str, site_content: &str) -> String {
    format!("{} {}", knowledge, site_content)
}
