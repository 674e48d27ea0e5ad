//! Per-visitor chat panel state
//!
//! A session owns the panel's visibility, the transcript, the summary status
//! and the visitor's draft. Submitting is split in two so the caller never
//! holds the session across a model call:
//!
//! 1. [`ChatSession::submit`] appends the user message and decides whether
//!    the question goes out.
//! 2. [`ChatSession::resolve_answer`] appends the bot reply once the answer
//!    flow settles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::conversation::{ConversationMessage, Transcript};
use crate::flows::{AnswerOutput, FlowError, SummarizeOutput};

use super::input::{Composer, KeyPress};

pub const STILL_PROCESSING: &str = "Still processing the website. Please try again in a few seconds.";
pub const SUMMARY_FAILED: &str =
    "Sorry, I couldn't read this website. Please reload the page and try again.";
pub const NO_ANSWER: &str = "No answer found.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong, please try again.";

/// Readiness gate for question answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SummaryStatus {
    Pending,
    Ready { summary: String },
    Failed { reason: String },
}

/// What a submission led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing appended (blank text or closed panel)
    Ignored,
    /// User message plus an advisory; no answer call
    Advised,
    /// User message appended; the caller must run the answer flow and
    /// hand the result to `resolve_answer`
    Ask(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    Smooth,
}

/// Serializable snapshot handed to the front end
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub open: bool,
    pub summary: SummaryStatus,
    pub messages: Vec<ConversationMessage>,
    pub draft: String,
    /// Set once after the transcript grows
    pub scroll: Option<ScrollBehavior>,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    open: bool,
    transcript: Transcript,
    summary: SummaryStatus,
    composer: Composer,
    scroll_pending: bool,
    last_active: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            open: false,
            transcript: Transcript::new(),
            summary: SummaryStatus::Pending,
            composer: Composer::default(),
            scroll_pending: false,
            last_active: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip visibility. The transcript is untouched.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn summary(&self) -> &SummaryStatus {
        &self.summary
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Record the result of the mount-time summarize call. Only the first
    /// result counts.
    pub fn settle_summary(&mut self, result: Result<Option<SummarizeOutput>, FlowError>) {
        if self.summary != SummaryStatus::Pending {
            return;
        }
        self.summary = match result {
            Ok(Some(output)) if !output.website_summary.trim().is_empty() => SummaryStatus::Ready {
                summary: output.website_summary,
            },
            Ok(_) => SummaryStatus::Failed {
                reason: "summarize flow returned no summary".to_string(),
            },
            Err(e) => SummaryStatus::Failed {
                reason: e.to_string(),
            },
        };
    }

    fn add_bot(&mut self, text: impl Into<String>) {
        self.transcript.add_bot(text);
        self.scroll_pending = true;
    }

    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if !self.is_open() || text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        self.transcript.add_user(text);
        self.scroll_pending = true;

        match &self.summary {
            SummaryStatus::Ready { .. } => SubmitOutcome::Ask(text.to_string()),
            SummaryStatus::Pending => {
                self.add_bot(STILL_PROCESSING);
                SubmitOutcome::Advised
            }
            SummaryStatus::Failed { .. } => {
                self.add_bot(SUMMARY_FAILED);
                SubmitOutcome::Advised
            }
        }
    }

    pub fn resolve_answer(&mut self, result: Result<Option<AnswerOutput>, FlowError>) {
        let text = match result {
            Ok(Some(output)) if !output.answer.is_empty() => output.answer,
            Ok(_) => NO_ANSWER.to_string(),
            Err(e) => {
                tracing::warn!("Answer failed for session {}: {}", self.id, e);
                SOMETHING_WENT_WRONG.to_string()
            }
        };
        self.add_bot(text);
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.set_draft(text);
    }

    /// Apply a key press to the draft; returns text to submit on Enter
    pub fn press_key(&mut self, press: &KeyPress) -> Option<String> {
        self.composer.press(press)
    }

    pub fn take_scroll_request(&mut self) -> Option<ScrollBehavior> {
        std::mem::take(&mut self.scroll_pending).then_some(ScrollBehavior::Smooth)
    }

    /// Snapshot for the front end; consumes any pending scroll request
    pub fn view(&mut self) -> SessionView {
        SessionView {
            id: self.id,
            open: self.is_open(),
            summary: self.summary().clone(),
            messages: self.transcript().messages().to_vec(),
            draft: self.composer.draft().to_string(),
            scroll: self.take_scroll_request(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;
    use crate::providers::ProviderError;

    fn ready_session() -> ChatSession {
        let mut session = ChatSession::new();
        session.toggle();
        session.settle_summary(Ok(Some(SummarizeOutput {
            website_summary: "Acme sells consulting.".into(),
        })));
        session
    }

    fn texts(session: &ChatSession) -> Vec<(Sender, String)> {
        session
            .transcript()
            .messages()
            .iter()
            .map(|m| (m.sender, m.text.clone()))
            .collect()
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut session = ready_session();
        for blank in ["", "   ", "\n\t "] {
            assert_eq!(session.submit(blank), SubmitOutcome::Ignored);
        }
        assert!(texts(&session).is_empty());
        assert!(session.take_scroll_request().is_none());
    }

    #[test]
    fn test_closed_panel_ignores_submit() {
        let mut session = ChatSession::new();
        assert_eq!(session.submit("hello"), SubmitOutcome::Ignored);
        assert!(texts(&session).is_empty());
    }

    #[test]
    fn test_pending_summary_gets_advisory() {
        let mut session = ChatSession::new();
        session.toggle();

        assert_eq!(session.submit("What is Acme?"), SubmitOutcome::Advised);
        assert_eq!(
            texts(&session),
            vec![
                (Sender::User, "What is Acme?".to_string()),
                (Sender::Bot, STILL_PROCESSING.to_string()),
            ]
        );
    }

    #[test]
    fn test_ready_summary_asks_with_exact_text() {
        let mut session = ready_session();
        let question = "  What do you offer?  ";
        assert_eq!(session.submit(question), SubmitOutcome::Ask(question.to_string()));
        assert_eq!(texts(&session), vec![(Sender::User, question.to_string())]);

        session.resolve_answer(Ok(Some(AnswerOutput {
            answer: "Consulting, training and support.".into(),
        })));
        assert_eq!(
            session.transcript().messages(),
            &[
                ConversationMessage::user(question),
                ConversationMessage::bot("Consulting, training and support."),
            ]
        );
    }

    #[test]
    fn test_empty_or_absent_answer_uses_fallback() {
        let mut session = ready_session();

        session.submit("one");
        session.resolve_answer(Ok(Some(AnswerOutput { answer: String::new() })));
        session.submit("two");
        session.resolve_answer(Ok(None));

        let bot: Vec<_> = texts(&session)
            .into_iter()
            .filter(|(sender, _)| *sender == Sender::Bot)
            .map(|(_, text)| text)
            .collect();
        assert_eq!(bot, vec![NO_ANSWER, NO_ANSWER]);
    }

    #[test]
    fn test_answer_error_becomes_message() {
        let mut session = ready_session();
        session.submit("hello");
        session.resolve_answer(Err(FlowError::Provider(ProviderError::InvalidResponse(
            "HTTP 503".into(),
        ))));
        assert_eq!(texts(&session)[1], (Sender::Bot, SOMETHING_WENT_WRONG.to_string()));

        // Panel keeps working afterwards
        assert!(matches!(session.submit("again"), SubmitOutcome::Ask(_)));
    }

    #[test]
    fn test_failed_summary() {
        let mut session = ChatSession::new();
        session.toggle();
        session.settle_summary(Err(FlowError::Validation("output.websiteSummary is required".into())));

        assert!(matches!(session.summary(), SummaryStatus::Failed { .. }));
        assert_eq!(session.submit("hi"), SubmitOutcome::Advised);
        assert_eq!(texts(&session)[1], (Sender::Bot, SUMMARY_FAILED.to_string()));
    }

    #[test]
    fn test_absent_summary_counts_as_failure() {
        let mut session = ChatSession::new();
        session.settle_summary(Ok(None));
        assert!(matches!(session.summary(), SummaryStatus::Failed { .. }));
    }

    #[test]
    fn test_summary_settles_once() {
        let mut session = ready_session();
        session.settle_summary(Err(FlowError::Validation("late".into())));
        assert!(matches!(session.summary(), SummaryStatus::Ready { .. }));
    }

    #[test]
    fn test_toggle_preserves_transcript() {
        let mut session = ChatSession::new();
        session.toggle();
        session.submit("hello");
        let before = texts(&session);

        assert!(!session.toggle());
        assert!(session.toggle());
        assert_eq!(texts(&session), before);
    }

    #[test]
    fn test_scroll_request_after_growth() {
        let mut session = ready_session();
        assert!(session.view().scroll.is_none());

        session.submit("hello");
        let view = session.view();
        assert_eq!(view.scroll, Some(ScrollBehavior::Smooth));
        assert!(session.view().scroll.is_none());
    }

    #[test]
    fn test_press_key_submits_draft() {
        let mut session = ready_session();
        session.set_draft("Where are you?");
        assert!(session.press_key(&KeyPress::new("Enter", true)).is_none());
        let text = session.press_key(&KeyPress::new("Enter", false)).unwrap();
        assert_eq!(text, "Where are you?\n");
        assert_eq!(session.view().draft, "");
    }

    #[test]
    fn test_view_serializes_summary_tag() {
        let mut session = ready_session();
        let json = serde_json::to_value(session.view()).unwrap();
        assert_eq!(json["summary"]["status"], "ready");
        assert_eq!(json["summary"]["summary"], "Acme sells consulting.");
        assert_eq!(json["open"], true);
        assert!(json["scroll"].is_null());
    }
}
