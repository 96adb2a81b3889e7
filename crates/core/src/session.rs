//! Voice Session Bookkeeping
//!
//! A session is looked up (or created) once when a client connects and is
//! never changed afterwards. Nothing here is persisted.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifies a session by the user that owns it and its client-chosen id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub key: SessionKey,
    pub created_at: DateTime<Utc>,
}

/// Storage for voice sessions.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn get_session(&self, key: &SessionKey) -> Result<Option<Arc<Session>>>;

    /// Creates the session for `key`. If one already exists it is returned
    /// unchanged, so a key never maps to two session objects.
    async fn create_session(&self, key: &SessionKey) -> Result<Arc<Session>>;
}

/// Looks up the session for `key`, creating it on first use.
pub async fn get_or_create_session(
    sessions: &dyn SessionService,
    key: &SessionKey,
) -> Result<Arc<Session>> {
    if let Some(session) = sessions.get_session(key).await? {
        tracing::debug!(session = %key, "Reusing existing session");
        return Ok(session);
    }
    tracing::info!(session = %key, "Creating new session");
    sessions.create_session(key).await
}

/// Process-local session store; sessions live as long as the process.
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: Mutex<HashMap<SessionKey, Arc<Session>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn get_session(&self, key: &SessionKey) -> Result<Option<Arc<Session>>> {
        Ok(self.sessions.lock().await.get(key).cloned())
    }

    async fn create_session(&self, key: &SessionKey) -> Result<Arc<Session>> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(key.clone()).or_insert_with(|| {
            Arc::new(Session {
                key: key.clone(),
                created_at: Utc::now(),
            })
        });
        Ok(session.clone())
    }
}
