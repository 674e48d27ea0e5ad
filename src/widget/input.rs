//! Draft text and key handling for the chat input box

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// Key name as reported by the browser (`KeyboardEvent.key`)
    pub key: String,
    #[serde(default)]
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, shift: bool) -> Self {
        Self {
            key: key.into(),
            shift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    InsertNewline,
    Nothing,
}

impl KeyAction {
    /// Enter submits, Shift+Enter breaks the line
    pub fn for_key(press: &KeyPress) -> Self {
        match (press.key.as_str(), press.shift) {
            ("Enter", false) => KeyAction::Submit,
            ("Enter", true) => KeyAction::InsertNewline,
            _ => KeyAction::Nothing,
        }
    }
}

/// The visitor's unsent text
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Take the draft for sending, leaving the box empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    /// Apply a key press. Returns the text to submit, if the key sends it.
    pub fn press(&mut self, press: &KeyPress) -> Option<String> {
        match KeyAction::for_key(press) {
            KeyAction::Submit => Some(self.take()),
            KeyAction::InsertNewline => {
                self.draft.push('\n');
                None
            }
            KeyAction::Nothing => None,
        }
    }
}
