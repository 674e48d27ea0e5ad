//! Prompt flows
//!
//! A flow is a named, schema-checked request/response pair around one model
//! completion. The widget uses two:
//!
//! - `summarize`: `{ websiteContent }` -> `{ websiteSummary }`
//! - `answer`: `{ question, websiteContent }` -> `{ answer }`
//!
//! Flows never talk to a provider directly. They go through a
//! [`PromptExecutor`], so tests can swap in a scripted executor.

pub mod executor;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::prompts::PromptError;
use crate::config::TemplateId;
use crate::knowledge::{self, KnowledgeBase, KnowledgeError, SiteContent};
use crate::providers::ProviderError;

pub use executor::ProviderExecutor;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Template error: {0}")]
    Template(#[from] PromptError),
}

/// Runs a named prompt template against a model.
///
/// Returns `None` when the model produced no output at all.
#[async_trait]
pub trait PromptExecutor: Send + Sync {
    async fn execute(&self, template: TemplateId, input: Value) -> Result<Option<Value>, FlowError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInput {
    pub website_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOutput {
    pub website_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question: String,
    pub website_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutput {
    pub answer: String,
}

/// Check that `record` is an object carrying every named field as a string
fn validate_record(record: &Value, fields: &[&str], what: &str) -> Result<(), FlowError> {
    let object = record
        .as_object()
        .ok_or_else(|| FlowError::Validation(format!("{} must be an object", what)))?;
    for field in fields {
        match object.get(*field) {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(FlowError::Validation(format!(
                    "{}.{} must be a string",
                    what, field
                )))
            }
            None => {
                return Err(FlowError::Validation(format!(
                    "{}.{} is required",
                    what, field
                )))
            }
        }
    }
    Ok(())
}

/// The two widget flows bound to an executor and a knowledge file
#[derive(Clone)]
pub struct Flows {
    executor: Arc<dyn PromptExecutor>,
    knowledge: KnowledgeBase,
}

impl Flows {
    pub fn new(executor: Arc<dyn PromptExecutor>, knowledge: KnowledgeBase) -> Self {
        Self { executor, knowledge }
    }

    async fn run<I, O>(&self, template: TemplateId, input: &I) -> Result<Option<O>, FlowError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input)
            .map_err(|e| FlowError::Validation(format!("input: {}", e)))?;
        validate_record(&input, template.input_fields(), "input")?;

        tracing::debug!("Running {} flow", template);
        let Some(output) = self.executor.execute(template, input).await? else {
            tracing::warn!("{} flow returned no output", template);
            return Ok(None);
        };

        validate_record(&output, &[template.output_field()], "output")?;
        serde_json::from_value(output)
            .map(Some)
            .map_err(|e| FlowError::Validation(format!("output: {}", e)))
    }

    pub async fn summarize(&self, input: SummarizeInput) -> Result<Option<SummarizeOutput>, FlowError> {
        self.run(TemplateId::Summarize, &input).await
    }

    async fn answer(&self, input: AnswerInput) -> Result<Option<AnswerOutput>, FlowError> {
        self.run(TemplateId::Answer, &input).await
    }

    /// Run the answer flow with the knowledge file, read now, prepended to
    /// `website_content`
    pub async fn answer_with_knowledge(&self, input: AnswerInput) -> Result<Option<AnswerOutput>, FlowError> {
        let knowledge_text = self.knowledge.load().await?;
        self.answer(AnswerInput {
            website_content: knowledge::combine(&knowledge_text, &input.website_content),
            question: input.question,
        })
        .await
    }

    /// Answer a visitor question about the configured site
    pub async fn answer_about_site(
        &self,
        question: &str,
        site: &SiteContent,
    ) -> Result<Option<AnswerOutput>, FlowError> {
        self.answer_with_knowledge(AnswerInput {
            question: question.to_string(),
            website_content: site.as_str().to_string(),
        })
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{knowledge_file, ScriptedExecutor};
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_answer_about_site_merges_knowledge() {
        let executor = Arc::new(ScriptedExecutor::new().reply(Ok(Some(json!({"answer": "A"})))));
        let kb = knowledge_file("K");
        let flows = Flows::new(executor.clone(), kb.knowledge_base());

        let output = flows
            .answer_about_site("Q", &SiteContent::new("P"))
            .await
            .unwrap();
        assert_eq!(output, Some(AnswerOutput { answer: "A".into() }));

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, TemplateId::Answer);
        assert_eq!(calls[0].1, json!({"question": "Q", "websiteContent": "K P"}));
    }

    #[tokio::test]
    async fn test_summarize_passes_content_verbatim() {
        let executor = Arc::new(
            ScriptedExecutor::new().reply(Ok(Some(json!({"websiteSummary": "Acme does consulting."})))),
        );
        let kb = knowledge_file("");
        let flows = Flows::new(executor.clone(), kb.knowledge_base());

        let output = flows
            .summarize(SummarizeInput {
                website_content: "  Welcome\n".into(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output.website_summary, "Acme does consulting.");
        assert_eq!(executor.calls()[0].1, json!({"websiteContent": "  Welcome\n"}));
    }

    #[tokio::test]
    async fn test_malformed_output_is_validation_error() {
        let executor = Arc::new(ScriptedExecutor::new().reply(Ok(Some(json!({"answer": 42})))));
        let kb = knowledge_file("");
        let flows = Flows::new(executor, kb.knowledge_base());

        let result = flows
            .answer_with_knowledge(AnswerInput {
                question: "Q".into(),
                website_content: "P".into(),
            })
            .await;
        assert!(matches!(assert_err!(result), FlowError::Validation(_)));
    }

    #[tokio::test]
    async fn test_answer_with_knowledge_prepends_to_supplied_content() {
        let executor = Arc::new(ScriptedExecutor::new().reply(Ok(Some(json!({"answer": "A"})))));
        let kb = knowledge_file("K");
        let flows = Flows::new(executor.clone(), kb.knowledge_base());

        let output = flows
            .answer_with_knowledge(AnswerInput {
                question: "Q".into(),
                website_content: "P2".into(),
            })
            .await;
        assert_eq!(assert_ok!(output), Some(AnswerOutput { answer: "A".into() }));
        assert_eq!(executor.calls()[0].1, json!({"question": "Q", "websiteContent": "K P2"}));
    }

    #[tokio::test]
    async fn test_knowledge_file_removed_on_drop() {
        let kb = knowledge_file("K");
        let path = kb.knowledge_base().path().to_path_buf();
        assert!(path.exists());
        drop(kb);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_absent_output() {
        let executor = Arc::new(ScriptedExecutor::new().reply(Ok(None)));
        let kb = knowledge_file("");
        let flows = Flows::new(executor, kb.knowledge_base());

        let result = flows
            .summarize(SummarizeInput {
                website_content: "P".into(),
            })
            .await;
        assert_eq!(assert_ok!(result), None);
    }

    #[tokio::test]
    async fn test_missing_knowledge_file_skips_remote_call() {
        let executor = Arc::new(ScriptedExecutor::new());
        let missing = std::env::temp_dir().join(format!("sitechat-none-{}.txt", uuid::Uuid::new_v4()));
        let flows = Flows::new(executor.clone(), KnowledgeBase::new(missing));

        let result = flows.answer_about_site("Q", &SiteContent::new("P")).await;
        assert!(matches!(assert_err!(result), FlowError::Knowledge(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let executor = Arc::new(ScriptedExecutor::new().reply(Err(FlowError::Provider(
            ProviderError::InvalidResponse("HTTP 500".into()),
        ))));
        let kb = knowledge_file("K");
        let flows = Flows::new(executor, kb.knowledge_base());

        let result = flows.answer_about_site("Q", &SiteContent::new("P")).await;
        assert!(matches!(assert_err!(result), FlowError::Provider(_)));
    }

    #[test]
    fn test_validate_record() {
        assert!(validate_record(&json!({"a": "x"}), &["a"], "input").is_ok());
        assert!(validate_record(&json!({"a": 1}), &["a"], "input").is_err());
        assert!(validate_record(&json!({}), &["a"], "input").is_err());
        assert!(validate_record(&json!("a"), &["a"], "input").is_err());
    }
}
