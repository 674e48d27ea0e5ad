//! Provider-backed prompt executor
//!
//! Renders the flow's template, sends it to the configured provider and
//! turns the completion into the flow's output record. Models are asked for
//! a JSON object; plain-text replies are accepted and wrapped.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::{PromptManager, TemplateId};
use crate::providers::{Message, Provider};

use super::{FlowError, PromptExecutor};

pub struct ProviderExecutor {
    provider: Provider,
    model: String,
    prompts: PromptManager,
}

impl ProviderExecutor {
    pub fn new(provider: Provider, model: impl Into<String>, prompts: PromptManager) -> Self {
        Self {
            provider,
            model: model.into(),
            prompts,
        }
    }
}

#[async_trait]
impl PromptExecutor for ProviderExecutor {
    async fn execute(&self, template: TemplateId, input: Value) -> Result<Option<Value>, FlowError> {
        let prompt = self.prompts.get(template);
        let messages = vec![
            Message::system(output_instructions(template)),
            Message::user(prompt.render(&input)?),
        ];

        tracing::debug!(
            "Sending '{}' to {} (model {})",
            prompt.name,
            self.provider.name(),
            self.model
        );

        let completion = self.provider.chat(&messages, &self.model).await?;
        Ok(completion.map(|text| parse_output(template, &text)))
    }
}

fn output_instructions(template: TemplateId) -> String {
    format!(
        "Respond with a single JSON object of the form {{\"{}\": \"<your response>\"}} and nothing else.",
        template.output_field()
    )
}

/// Turn a completion into the flow's output record
fn parse_output(template: TemplateId, text: &str) -> Value {
    let field = template.output_field();
    let trimmed = strip_code_fence(text.trim());

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(trimmed) {
        if object.contains_key(field) {
            return Value::Object(object);
        }
    }

    let mut object = Map::new();
    object.insert(field.to_string(), Value::String(text.trim().to_string()));
    Value::Object(object)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}
