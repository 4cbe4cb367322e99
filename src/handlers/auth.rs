use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    Extension, Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::convert::Infallible;

use crate::app::AppState;
use crate::directory::authenticate;
use crate::error::AppError;
use crate::protocol::ProtocolResponse;
use crate::session::{Session, FLASH_ERRORS_KEY, PRINCIPAL_KEY};

pub const INVALID_CREDENTIALS: &str = "Las credenciales no coinciden con nuestros registros.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Accepts either a JSON or an urlencoded form body. Anything unreadable
/// becomes empty credentials, which then fail like a wrong password.
#[axum::async_trait]
impl<S: Send + Sync> FromRequest<S> for LoginRequest {
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let parsed = if is_form {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map(|Form(p)| p)
                .ok()
        } else {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map(|Json(p)| p)
                .ok()
        };

        Ok(parsed.unwrap_or_default())
    }
}

/// POST /login - Authenticate and start a session
///
/// Success stores the principal and redirects (303) to `/dashboard`. Failure
/// leaves a flash error on `email` for the next render and redirects (303)
/// back to `/login`.
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    LoginRequest { email, password }: LoginRequest,
) -> Result<ProtocolResponse, AppError> {
    let email = email.unwrap_or_default();
    let password = password.unwrap_or_default();

    match authenticate(state.users.as_ref(), &email, &password).await {
        Some(user) => {
            session.insert(PRINCIPAL_KEY, json!(user.email)).await?;
            tracing::info!("Login successful for {}", user.email);
            Ok(ProtocolResponse::redirect("/dashboard"))
        }
        None => {
            tracing::warn!("Login failed for [{}]", email);
            let mut errors = Map::new();
            errors.insert("email".to_string(), json!(INVALID_CREDENTIALS));
            session.insert(FLASH_ERRORS_KEY, Value::Object(errors)).await?;
            Ok(ProtocolResponse::redirect("/login"))
        }
    }
}

/// POST /logout - Destroy the session and return to the login page
pub async fn logout(Extension(session): Extension<Session>) -> Result<ProtocolResponse, AppError> {
    session.invalidate().await?;
    tracing::info!("Session closed");
    Ok(ProtocolResponse::redirect("/login"))
}
