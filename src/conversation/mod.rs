//! Widget conversation types
//!
//! A transcript is append-only: messages are never edited, removed or
//! reordered, so insertion order is display order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub sender: Sender,
    pub text: String,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ConversationMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, text: impl Into<String>) {
        self.messages.push(ConversationMessage::user(text));
    }

    pub fn add_bot(&mut self, text: impl Into<String>) {
        self.messages.push(ConversationMessage::bot(text));
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }
}
