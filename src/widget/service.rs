//! Drives sessions through the prompt flows

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::flows::{Flows, SummarizeInput};
use crate::knowledge::SiteContent;

use super::input::KeyPress;
use super::session::{ChatSession, SessionView, SubmitOutcome};
use super::store::{SessionStore, SharedSession};

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),
}

pub struct WidgetService {
    store: SessionStore,
    flows: Flows,
    site: SiteContent,
}

impl WidgetService {
    pub fn new(flows: Flows, site: SiteContent, idle_timeout: Duration) -> Self {
        Self {
            store: SessionStore::new(idle_timeout),
            flows,
            site,
        }
    }

    pub fn flows(&self) -> &Flows {
        &self.flows
    }

    async fn session(&self, id: Uuid) -> Result<SharedSession, WidgetError> {
        self.store
            .get(&id)
            .await
            .ok_or(WidgetError::SessionNotFound(id))
    }

    /// Create a session and start its summarize call in the background
    pub async fn mount(self: &Arc<Self>) -> SessionView {
        let (id, shared) = self.store.insert(ChatSession::new()).await;
        tracing::info!("Session {} mounted", id);

        let service = Arc::clone(self);
        let session = Arc::clone(&shared);
        tokio::spawn(async move {
            let result = service
                .flows
                .summarize(SummarizeInput {
                    website_content: service.site.as_str().to_string(),
                })
                .await;
            if let Err(ref e) = result {
                tracing::warn!("Summarize failed for session {}: {}", id, e);
            }
            session.lock().await.settle_summary(result);
            tracing::debug!("Session {} summary settled", id);
        });

        let mut session = shared.lock().await;
        session.view()
    }

    pub async fn view(&self, id: Uuid) -> Result<SessionView, WidgetError> {
        let shared = self.session(id).await?;
        let mut session = shared.lock().await;
        session.touch();
        Ok(session.view())
    }

    pub async fn toggle(&self, id: Uuid) -> Result<SessionView, WidgetError> {
        let shared = self.session(id).await?;
        let mut session = shared.lock().await;
        session.touch();
        session.toggle();
        Ok(session.view())
    }

    /// Submit a message. The session lock is released while the answer flow
    /// runs.
    pub async fn submit(&self, id: Uuid, text: &str) -> Result<SessionView, WidgetError> {
        let shared = self.session(id).await?;
        self.submit_to(&shared, text).await;
        let mut session = shared.lock().await;
        Ok(session.view())
    }

    async fn submit_to(&self, shared: &SharedSession, text: &str) {
        let outcome = {
            let mut session = shared.lock().await;
            session.touch();
            session.submit(text)
        };

        if let SubmitOutcome::Ask(question) = outcome {
            let result = self.flows.answer_about_site(&question, &self.site).await;
            shared.lock().await.resolve_answer(result);
        }
    }

    /// Replace the draft with `draft`, then apply the key press
    pub async fn press_key(
        &self,
        id: Uuid,
        draft: String,
        press: &KeyPress,
    ) -> Result<SessionView, WidgetError> {
        let shared = self.session(id).await?;
        let to_send = {
            let mut session = shared.lock().await;
            session.touch();
            session.set_draft(draft);
            session.press_key(press)
        };

        if let Some(text) = to_send {
            self.submit_to(&shared, &text).await;
        }

        let mut session = shared.lock().await;
        Ok(session.view())
    }

    pub async fn close(&self, id: Uuid) -> Result<(), WidgetError> {
        if self.store.remove(&id).await {
            tracing::info!("Session {} closed", id);
            Ok(())
        } else {
            Err(WidgetError::SessionNotFound(id))
        }
    }

    pub async fn evict_idle(&self) -> usize {
        let evicted = self.store.evict_idle(Utc::now()).await;
        if evicted > 0 {
            tracing::info!(
                "Evicted {} idle session(s), {} still active",
                evicted,
                self.store.len().await
            );
        }
        evicted
    }
}
