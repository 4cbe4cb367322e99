use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{SessionError, SessionStore};

/// Idle period after which a session is dropped (servlet container default)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct Entry {
    attributes: HashMap<String, Value>,
    last_seen: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            attributes: HashMap::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.duration_since(self.last_seen) >= idle_timeout
    }
}

/// Process-local session store. A session untouched for longer than the idle
/// timeout reads as missing and is pruned on the next write.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Sessions currently held, expired ones included until pruned
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every expired session and returns how many went
    pub async fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, entry| !entry.is_expired(now, self.idle_timeout));
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} idle sessions", pruned);
        }
        pruned
    }

    /// Live entry for `id`, touched; an expired entry is removed instead
    fn touch<'a>(
        sessions: &'a mut HashMap<String, Entry>,
        id: &str,
        idle_timeout: Duration,
    ) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if sessions.get(id)?.is_expired(now, idle_timeout) {
            sessions.remove(id);
            return None;
        }
        let entry = sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(entry)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn exists(&self, id: &str) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(Self::touch(&mut sessions, id, self.idle_timeout).is_some())
    }

    async fn get(&self, id: &str, key: &str) -> Result<Option<Value>, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(Self::touch(&mut sessions, id, self.idle_timeout)
            .and_then(|entry| entry.attributes.get(key).cloned()))
    }

    async fn insert(&self, id: &str, key: &str, value: Value) -> Result<(), SessionError> {
        self.prune_expired().await;

        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(id.to_string()).or_insert_with(Entry::new);
        entry.last_seen = Instant::now();
        entry.attributes.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, id: &str, key: &str) -> Result<Option<Value>, SessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(Self::touch(&mut sessions, id, self.idle_timeout)
            .and_then(|entry| entry.attributes.remove(key)))
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
