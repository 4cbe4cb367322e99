pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryUserDirectory;
pub use postgres::PgUserDirectory;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User directory unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// BCrypt hash (`$2a$`/`$2b$`/`$2y$`) of the password
    pub password_hash: String,
    pub role: Option<RoleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<PermissionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub name: String,
    pub module: Option<ModuleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
}

/// Resolves users by their unique email
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, DirectoryError> {
    Ok(bcrypt::hash(password, cost)?)
}

impl UserRecord {
    /// Malformed stored hashes never match
    pub fn verify_password(&self, password: &str) -> bool {
        match bcrypt::verify(password, &self.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("Unreadable password hash for {}: {}", self.email, e);
                false
            }
        }
    }
}

/// Looks the user up and checks the password; lookup failures count as bad credentials
pub async fn authenticate(
    lookup: &dyn UserLookup,
    email: &str,
    password: &str,
) -> Option<UserRecord> {
    if email.trim().is_empty() || password.is_empty() {
        return None;
    }

    match lookup.find_by_email(email.trim()).await {
        Ok(Some(user)) if user.verify_password(password) => Some(user),
        Ok(Some(_)) => {
            tracing::debug!("Password mismatch for {}", email);
            None
        }
        Ok(None) => {
            tracing::debug!("No user found with email {}", email);
            None
        }
        Err(e) => {
            tracing::error!("User lookup failed during authentication: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_hash(email: &str, password_hash: &str) -> UserRecord {
        UserRecord {
            id: 7,
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn stored_2a_hashes_authenticate() {
        // $2a$ hash as written by the existing user table
        let directory = MemoryUserDirectory::with_users([user_with_hash(
            "admin@tsf.com",
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
        )]);

        let user = authenticate(&directory, "admin@tsf.com", "U*U").await;
        assert_eq!(user.map(|u| u.id), Some(7));
        assert!(authenticate(&directory, "admin@tsf.com", "U*V").await.is_none());
    }

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("secret", 4).unwrap();
        assert!(hash.starts_with("$2"));

        let user = user_with_hash("a@b.c", &hash);
        assert!(user.verify_password("secret"));
        assert!(!user.verify_password("Secret"));
    }

    #[test]
    fn malformed_hashes_never_match() {
        let legacy = user_with_hash(
            "a@b.c",
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b",
        );
        assert!(!legacy.verify_password("secret"));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let directory = MemoryUserDirectory::demo().unwrap();

        assert!(authenticate(&directory, "admin@example.com", "password").await.is_some());
        assert!(authenticate(&directory, "admin@example.com", "wrong").await.is_none());
        assert!(authenticate(&directory, "nobody@example.com", "password").await.is_none());
        assert!(authenticate(&directory, "", "password").await.is_none());
    }
}
