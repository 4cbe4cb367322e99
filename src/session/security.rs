use serde_json::Value;

use super::{Session, PRINCIPAL_KEY};

/// Principal name carried by unauthenticated requests
pub const ANONYMOUS_PRINCIPAL: &str = "anonymousUser";

/// Read-only view of who is making the current request
pub trait SecurityContext: Send + Sync {
    fn current_principal_name(&self) -> Option<&str>;

    fn is_authenticated(&self) -> bool;
}

/// Security context resolved once per request from the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: Option<String>,
    authenticated: bool,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            name: Some(ANONYMOUS_PRINCIPAL.to_string()),
            authenticated: true,
        }
    }

    pub fn none() -> Self {
        Self {
            name: None,
            authenticated: false,
        }
    }

    pub fn user(email: impl Into<String>) -> Self {
        Self {
            name: Some(email.into()),
            authenticated: true,
        }
    }

    /// Store failures resolve to the anonymous principal
    pub async fn from_session(session: &Session) -> Self {
        match session.get(PRINCIPAL_KEY).await {
            Ok(Some(Value::String(email))) if !email.is_empty() => Self::user(email),
            Ok(_) => Self::anonymous(),
            Err(e) => {
                tracing::warn!("Failed to read principal from session: {}", e);
                Self::anonymous()
            }
        }
    }
}

impl SecurityContext for Principal {
    fn current_principal_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn session_without_principal_is_anonymous() {
        let session = Session::fresh(Arc::new(MemorySessionStore::new()));
        let principal = Principal::from_session(&session).await;
        assert_eq!(principal.current_principal_name(), Some(ANONYMOUS_PRINCIPAL));
    }

    #[tokio::test]
    async fn session_principal_is_authenticated() {
        let session = Session::fresh(Arc::new(MemorySessionStore::new()));
        session.insert(PRINCIPAL_KEY, json!("admin@example.com")).await.unwrap();

        let principal = Principal::from_session(&session).await;
        assert!(principal.is_authenticated());
        assert_eq!(principal.current_principal_name(), Some("admin@example.com"));
    }
}
