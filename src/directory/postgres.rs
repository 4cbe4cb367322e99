use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{DirectoryError, ModuleRecord, PermissionRecord, RoleRecord, UserLookup, UserRecord};

/// User directory backed by the admin schema (users, roles, permissions, modulos)
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;
        info!("Connected user directory pool ({} max connections)", max_connections);
        Ok(Self::new(pool))
    }

    async fn load_permissions(&self, role_id: i64) -> Result<Vec<PermissionRecord>, DirectoryError> {
        let query = r#"
            SELECT p.name AS permission_name, m.nombre AS module_name
            FROM role_has_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            LEFT JOIN modulos m ON m.id = p.modulo_id
            WHERE rp.role_id = $1
            ORDER BY p.id
        "#;

        let rows = sqlx::query(query).bind(role_id).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| PermissionRecord {
                name: row.get("permission_name"),
                module: row
                    .get::<Option<String>, _>("module_name")
                    .map(|name| ModuleRecord { name }),
            })
            .collect())
    }
}

#[async_trait]
impl UserLookup for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        // Inactive users (status <> 1) are invisible to the application
        let query = r#"
            SELECT u.id, u.name, u.email, u.password,
                   r.id AS role_id, r.name AS role_name
            FROM users u
            LEFT JOIN roles r ON r.id = u.rol_id
            WHERE u.email = $1
            AND u.status = 1
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role = match row.get::<Option<i64>, _>("role_id") {
            Some(role_id) => Some(RoleRecord {
                id: role_id,
                name: row.get::<Option<String>, _>("role_name").unwrap_or_default(),
                permissions: self.load_permissions(role_id).await?,
            }),
            None => None,
        };

        Ok(Some(UserRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get::<Option<String>, _>("password").unwrap_or_default(),
            role,
        }))
    }
}
