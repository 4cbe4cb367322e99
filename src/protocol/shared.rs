//! Shared state merged into every page object: the auth projection and the
//! session's pending flash errors. Nothing here aborts a render; every failure
//! degrades to "no user" / "no errors".

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::directory::{UserLookup, UserRecord};
use crate::session::{SecurityContext, Session, ANONYMOUS_PRINCIPAL, FLASH_ERRORS_KEY};
use crate::types::{AuthPermission, AuthProjection, AuthUser, FlashErrors};

#[derive(Clone)]
pub struct SharedStateProvider {
    lookup: Option<Arc<dyn UserLookup>>,
}

impl SharedStateProvider {
    pub fn new(lookup: Option<Arc<dyn UserLookup>>) -> Self {
        Self { lookup }
    }

    pub async fn resolve_auth(&self, security: &dyn SecurityContext) -> AuthProjection {
        let Some(lookup) = &self.lookup else {
            return AuthProjection::anonymous();
        };

        if !security.is_authenticated() {
            return AuthProjection::anonymous();
        }

        let email = match security.current_principal_name() {
            Some(name) if !name.is_empty() && name != ANONYMOUS_PRINCIPAL => name,
            _ => return AuthProjection::anonymous(),
        };

        match lookup.find_by_email(email).await {
            Ok(Some(user)) => AuthProjection {
                user: Some(project_user(&user)),
            },
            Ok(None) => {
                tracing::debug!("Authenticated principal {} has no user record", email);
                AuthProjection::anonymous()
            }
            Err(e) => {
                tracing::warn!("User lookup failed while resolving auth for {}: {}", email, e);
                AuthProjection::anonymous()
            }
        }
    }

    /// Hands back the session's flash errors and removes them from the session
    pub async fn resolve_and_clear_flash_errors(&self, session: Option<&Session>) -> FlashErrors {
        let Some(session) = session else {
            return Map::new();
        };

        match session.remove(FLASH_ERRORS_KEY).await {
            Ok(Some(Value::Object(errors))) => errors,
            Ok(Some(Value::Null)) | Ok(None) => Map::new(),
            Ok(Some(other)) => {
                tracing::warn!("Discarding malformed flash errors: {}", other);
                Map::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read flash errors from session: {}", e);
                Map::new()
            }
        }
    }
}

pub fn project_user(user: &UserRecord) -> AuthUser {
    let (role_id, role_name, permissions) = match &user.role {
        Some(role) => (
            Some(role.id),
            Some(role.name.clone()),
            role.permissions
                .iter()
                .map(|p| AuthPermission {
                    name: p.name.clone(),
                    module_name: p.module.as_ref().map(|m| m.name.clone()),
                })
                .collect(),
        ),
        None => (None, None, Vec::new()),
    };

    AuthUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role_id,
        role_name,
        permissions,
    }
}
