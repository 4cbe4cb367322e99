use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    hash_password, DirectoryError, ModuleRecord, PermissionRecord, RoleRecord, UserLookup,
    UserRecord,
};

/// Lowest cost bcrypt accepts
const DEMO_HASH_COST: u32 = 4;

/// In-process user directory keyed by lowercase email
#[derive(Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserDirectory {
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let map = users
            .into_iter()
            .map(|u| (u.email.to_lowercase(), u))
            .collect();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    /// Admin with module-scoped permissions plus a role-less user; password is "password"
    pub fn demo() -> Result<Self, DirectoryError> {
        let module = |name: &str| Some(ModuleRecord { name: name.to_string() });
        let permission = |name: &str, module_name: &str| PermissionRecord {
            name: name.to_string(),
            module: module(module_name),
        };

        let admin_role = RoleRecord {
            id: 1,
            name: "admin".to_string(),
            permissions: vec![
                permission("ver users", "Users"),
                permission("crear users", "Users"),
                permission("ver roles", "Roles"),
                permission("ver empresas", "Empresas"),
                permission("ver clientes", "Clientes"),
                permission("ver auditoria", "Auditoria"),
            ],
        };

        let password_hash = hash_password("password", DEMO_HASH_COST)?;

        Ok(Self::with_users([
            UserRecord {
                id: 1,
                name: "Administrator".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: password_hash.clone(),
                role: Some(admin_role),
            },
            UserRecord {
                id: 2,
                name: "Guest".to_string(),
                email: "guest@example.com".to_string(),
                password_hash,
                role: None,
            },
        ]))
    }
}

#[async_trait]
impl UserLookup for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.read().await.get(&email.to_lowercase()).cloned())
    }
}
