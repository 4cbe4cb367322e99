pub mod memory;
pub mod security;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemorySessionStore;
pub use security::{Principal, SecurityContext, ANONYMOUS_PRINCIPAL};

/// Session key holding one-shot validation errors
pub const FLASH_ERRORS_KEY: &str = "errors";

/// Session key holding the authenticated principal's email
pub const PRINCIPAL_KEY: &str = "principal";

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Storage backend for per-client session attributes, keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, SessionError>;

    async fn get(&self, id: &str, key: &str) -> Result<Option<Value>, SessionError>;

    /// Creates the session on first write
    async fn insert(&self, id: &str, key: &str, value: Value) -> Result<(), SessionError>;

    /// Removes the attribute and hands back what was stored
    async fn remove(&self, id: &str, key: &str) -> Result<Option<Value>, SessionError>;

    async fn destroy(&self, id: &str) -> Result<(), SessionError>;
}

/// Cookie change the session middleware must emit after the handler ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    Issue(String),
    Clear,
}

#[derive(Debug, Default)]
struct SessionState {
    id: Option<String>,
    incoming: bool,
    created: bool,
    invalidated: bool,
}

/// Request-scoped handle on the client's session.
///
/// The id is allocated lazily: reads against a request without a session never
/// create one, the first write does.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Handle for a request that did not present a (live) session cookie
    pub fn fresh(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Handle bound to a session id the client already holds
    pub fn existing(store: Arc<dyn SessionStore>, id: impl Into<String>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState {
                id: Some(id.into()),
                incoming: true,
                ..SessionState::default()
            })),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.lock().id.clone()
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        match self.id() {
            Some(id) => self.store.get(&id, key).await,
            None => Ok(None),
        }
    }

    pub async fn insert(&self, key: &str, value: Value) -> Result<(), SessionError> {
        let id = self.ensure_id();
        self.store.insert(&id, key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<Option<Value>, SessionError> {
        match self.id() {
            Some(id) => self.store.remove(&id, key).await,
            None => Ok(None),
        }
    }

    /// Drops every attribute and detaches the handle from its id
    pub async fn invalidate(&self) -> Result<(), SessionError> {
        let id = {
            let mut state = self.lock();
            state.invalidated = true;
            state.created = false;
            state.id.take()
        };
        if let Some(id) = id {
            self.store.destroy(&id).await?;
        }
        Ok(())
    }

    pub fn cookie_change(&self) -> Option<CookieChange> {
        let state = self.lock();
        match (&state.id, state.created, state.invalidated) {
            (Some(id), true, _) => Some(CookieChange::Issue(id.clone())),
            (None, _, true) if state.incoming => Some(CookieChange::Clear),
            _ => None,
        }
    }

    fn ensure_id(&self) -> String {
        let mut state = self.lock();
        if let Some(id) = &state.id {
            return id.clone();
        }
        let id = Uuid::new_v4().simple().to_string();
        state.id = Some(id.clone());
        state.created = true;
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // state holds no invariants a panicking writer could break
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Arc<dyn SessionStore> {
        Arc::new(MemorySessionStore::new())
    }

    #[tokio::test]
    async fn reads_without_session_do_not_create_one() {
        let session = Session::fresh(store());
        assert_eq!(session.get(FLASH_ERRORS_KEY).await.unwrap(), None);
        assert_eq!(session.remove(FLASH_ERRORS_KEY).await.unwrap(), None);
        assert!(session.id().is_none());
        assert_eq!(session.cookie_change(), None);
    }

    #[tokio::test]
    async fn first_write_issues_a_cookie() {
        let session = Session::fresh(store());
        session.insert(PRINCIPAL_KEY, json!("a@b.c")).await.unwrap();

        let id = session.id().expect("id allocated on write");
        assert_eq!(session.cookie_change(), Some(CookieChange::Issue(id)));
        assert_eq!(session.get(PRINCIPAL_KEY).await.unwrap(), Some(json!("a@b.c")));
    }

    #[tokio::test]
    async fn existing_session_keeps_its_cookie() {
        let backing = store();
        backing.insert("abc", PRINCIPAL_KEY, json!("x@y.z")).await.unwrap();

        let session = Session::existing(backing, "abc");
        assert_eq!(session.get(PRINCIPAL_KEY).await.unwrap(), Some(json!("x@y.z")));
        assert_eq!(session.cookie_change(), None);
    }

    #[tokio::test]
    async fn invalidate_clears_the_client_cookie() {
        let backing = store();
        backing.insert("abc", PRINCIPAL_KEY, json!("x@y.z")).await.unwrap();

        let session = Session::existing(backing.clone(), "abc");
        session.invalidate().await.unwrap();

        assert_eq!(session.cookie_change(), Some(CookieChange::Clear));
        assert!(!backing.exists("abc").await.unwrap());
    }
}
