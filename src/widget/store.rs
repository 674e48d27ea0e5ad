//! In-memory session registry
//!
//! Sessions live only as long as the process and are dropped after sitting
//! idle. There is no persistence.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::session::ChatSession;

pub type SharedSession = Arc<Mutex<ChatSession>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn insert(&self, session: ChatSession) -> (Uuid, SharedSession) {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, shared.clone());
        (id, shared)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions whose last activity is older than the idle timeout.
    /// Sessions busy at the moment are kept.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => now - session.last_active() < self.idle_timeout,
            Err(_) => true,
        });
        before - sessions.len()
    }
}
