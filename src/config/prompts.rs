//! Prompt templates for the widget's flows
//!
//! Each flow has a built-in template. A site may override the wording by
//! dropping `{id}.toml` into its prompts directory.
//!
//! # Example Override File
//!
//! ```toml
//! [template]
//! name = "terseSummary"
//! content = """
//! Summarize this in two sentences:
//! {{websiteContent}}
//! """
//! ```
//!
//! Placeholders use `{{field}}` (or `{{{field}}}`, with optional spaces inside
//! the braces) and the flow's camelCase input field names. An override must
//! keep every placeholder of its flow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Identifies which flow a template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Summarize,
    Answer,
}

impl TemplateId {
    pub const ALL: [TemplateId; 2] = [TemplateId::Summarize, TemplateId::Answer];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Summarize => "summarize",
            TemplateId::Answer => "answer",
        }
    }

    /// Required string fields of the flow's input record
    pub fn input_fields(&self) -> &'static [&'static str] {
        match self {
            TemplateId::Summarize => &["websiteContent"],
            TemplateId::Answer => &["question", "websiteContent"],
        }
    }

    /// The single string field of the flow's output record
    pub fn output_field(&self) -> &'static str {
        match self {
            TemplateId::Summarize => "websiteSummary",
            TemplateId::Answer => "answer",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: TemplateId,
    pub name: String,
    pub content: String,
}

impl PromptTemplate {
    pub fn builtin(id: TemplateId) -> Self {
        let (name, content) = match id {
            TemplateId::Summarize => ("generateWebsiteSummaryPrompt", builtin::SUMMARIZE),
            TemplateId::Answer => ("answerQuestionsAboutWebsitePrompt", builtin::ANSWER),
        };
        Self {
            id,
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    /// Substitute the input record's fields into the template.
    ///
    /// Single pass: text coming from the input is never re-scanned for
    /// placeholders. Unknown placeholders are left as written.
    pub fn render(&self, input: &Value) -> Result<String, PromptError> {
        let mut values = HashMap::new();
        for field in self.id.input_fields() {
            let value = input
                .get(*field)
                .and_then(Value::as_str)
                .ok_or_else(|| PromptError::MissingField(field.to_string()))?;
            values.insert(*field, value);
        }

        let mut rendered = String::with_capacity(self.content.len());
        for segment in segments(&self.content) {
            match segment {
                Segment::Text(text) => rendered.push_str(text),
                Segment::Placeholder { name, raw } => {
                    rendered.push_str(values.get(name).copied().unwrap_or(raw))
                }
            }
        }
        Ok(rendered)
    }

    fn check_placeholders(&self) -> Result<(), PromptError> {
        let names: HashSet<&str> = segments(&self.content)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder { name, .. } => Some(name),
                Segment::Text(_) => None,
            })
            .collect();

        for field in self.id.input_fields() {
            if !names.contains(field) {
                return Err(PromptError::ParseError(format!(
                    "template '{}' is missing the {{{{{}}}}} placeholder",
                    self.id, field
                )));
            }
        }
        Ok(())
    }
}

enum Segment<'a> {
    Text(&'a str),
    /// `name` is trimmed, `raw` is the placeholder as written
    Placeholder { name: &'a str, raw: &'a str },
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split template text into literal text and `{{name}}` / `{{{name}}}`
/// placeholders. Whitespace around the name is allowed.
fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start..];
        let (open, close) = if after.starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };
        let inner = &after[open.len()..];
        match inner.find(close) {
            Some(end) if is_placeholder_name(inner[..end].trim()) => {
                let len = open.len() + end + close.len();
                segments.push(Segment::Placeholder {
                    name: inner[..end].trim(),
                    raw: &after[..len],
                });
                rest = &after[len..];
            }
            _ => {
                segments.push(Segment::Text(&after[..open.len()]));
                rest = inner;
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    template: TemplateBody,
}

#[derive(Debug, Deserialize)]
struct TemplateBody {
    #[serde(default)]
    name: Option<String>,
    content: String,
}

/// Resolves and caches templates, preferring on-disk overrides
#[derive(Debug)]
pub struct PromptManager {
    /// Directory containing overrides, if any
    prompts_dir: Option<PathBuf>,

    cache: HashMap<TemplateId, PromptTemplate>,
}

impl PromptManager {
    /// Create a manager seeded with the built-in templates
    pub fn new(prompts_dir: Option<PathBuf>) -> Self {
        let cache = TemplateId::ALL
            .iter()
            .map(|id| (*id, PromptTemplate::builtin(*id)))
            .collect();
        Self { prompts_dir, cache }
    }

    /// Replace built-ins with any overrides found in the prompts directory
    pub async fn load_overrides(&mut self) -> Result<usize, PromptError> {
        let Some(dir) = self.prompts_dir.clone() else {
            return Ok(0);
        };

        let mut loaded = 0;
        for id in TemplateId::ALL {
            let path = dir.join(format!("{}.toml", id));
            if fs::try_exists(&path).await.unwrap_or(false) {
                let template = Self::load_from_file(id, &path).await?;
                tracing::info!("Loaded prompt override '{}' from {}", template.name, path.display());
                self.cache.insert(id, template);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Load a template override directly from a file path
    pub async fn load_from_file(id: TemplateId, path: &Path) -> Result<PromptTemplate, PromptError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let file: TemplateFile =
            toml::from_str(&content).map_err(|e| PromptError::ParseError(e.to_string()))?;

        let template = PromptTemplate {
            id,
            name: file.template.name.unwrap_or_else(|| id.to_string()),
            content: file.template.content,
        };
        template.check_placeholders()?;
        Ok(template)
    }

    pub fn get(&self, id: TemplateId) -> PromptTemplate {
        self.cache
            .get(&id)
            .cloned()
            .unwrap_or_else(|| PromptTemplate::builtin(id))
    }
}

/// Errors from prompt loading and rendering
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing input field: {0}")]
    MissingField(String),
}

/// Built-in prompts that don't require files
pub mod builtin {
    pub const SUMMARIZE: &str = r#"You are an expert summarizer. Please provide a concise summary of the following website content:

Website Content:
{{websiteContent}}
"#;

    pub const ANSWER: &str = r#"You are a chatbot answering questions about the content of a website. Answer using only the website content below.

Website Content: {{{websiteContent}}}

Question: {{{question}}}

Answer: "#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_answer_template() {
        let template = PromptTemplate::builtin(TemplateId::Answer);
        let rendered = template
            .render(&json!({"question": "Q", "websiteContent": "K P"}))
            .unwrap();
        assert!(rendered.contains("Website Content: K P"));
        assert!(rendered.contains("Question: Q"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_render_embeds_content_verbatim() {
        let template = PromptTemplate::builtin(TemplateId::Summarize);
        let content = "Line one\n  - {braces} stay\n";
        let rendered = template.render(&json!({"websiteContent": content})).unwrap();
        assert!(rendered.contains(content));
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let template = PromptTemplate::builtin(TemplateId::Answer);
        let rendered = template
            .render(&json!({"question": "what is {{websiteContent}}?", "websiteContent": "P"}))
            .unwrap();
        assert!(rendered.contains("Question: what is {{websiteContent}}?"));
    }

    #[test]
    fn test_render_missing_field() {
        let template = PromptTemplate::builtin(TemplateId::Answer);
        let err = template.render(&json!({"question": "Q"})).unwrap_err();
        assert!(matches!(err, PromptError::MissingField(f) if f == "websiteContent"));
    }

    #[test]
    fn test_manager_defaults_to_builtin() {
        let manager = PromptManager::new(None);
        assert_eq!(manager.get(TemplateId::Summarize), PromptTemplate::builtin(TemplateId::Summarize));
    }

    #[tokio::test]
    async fn test_load_override() {
        let dir = std::env::temp_dir().join(format!("sitechat-prompts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("summarize.toml"),
            "[template]\nname = \"short\"\ncontent = \"Two lines please: {{websiteContent}}\"\n",
        )
        .unwrap();

        let mut manager = PromptManager::new(Some(dir.clone()));
        assert_eq!(manager.load_overrides().await.unwrap(), 1);
        assert_eq!(manager.get(TemplateId::Summarize).name, "short");
        assert_eq!(manager.get(TemplateId::Answer), PromptTemplate::builtin(TemplateId::Answer));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_override_must_keep_placeholders() {
        let dir = std::env::temp_dir().join(format!("sitechat-prompts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("answer.toml");
        std::fs::write(&path, "[template]\ncontent = \"Answer {{question}}\"\n").unwrap();

        let result = PromptManager::load_from_file(TemplateId::Answer, &path).await;
        assert!(matches!(result, Err(PromptError::ParseError(_))));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_override_with_spaced_placeholders() {
        let dir = std::env::temp_dir().join(format!("sitechat-prompts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("answer.toml");
        std::fs::write(
            &path,
            "[template]\ncontent = \"Site: {{ websiteContent }} Q: {{{ question }}}\"\n",
        )
        .unwrap();

        let template = PromptManager::load_from_file(TemplateId::Answer, &path).await.unwrap();
        let rendered = template
            .render(&json!({"question": "Q", "websiteContent": "K P"}))
            .unwrap();
        assert_eq!(rendered, "Site: K P Q: Q");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unknown_placeholders_left_as_written() {
        let template = PromptTemplate {
            id: TemplateId::Summarize,
            name: "custom".into(),
            content: "{{ other }} {{websiteContent}} {{".into(),
        };
        let rendered = template.render(&json!({"websiteContent": "P"})).unwrap();
        assert_eq!(rendered, "{{ other }} P {{");
    }
}
