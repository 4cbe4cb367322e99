// HTTP-level error types and the boundary adapter that turns them into responses
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::directory::DirectoryError;
use crate::session::SessionError;

/// Classified failure of a request, translated to a transport response at the boundary
#[derive(Debug, Clone)]
pub enum AppError {
    // 404 Not Found (unroutable path or missing resource)
    NotFound(String),

    // 500 Internal Server Error: page object could not be serialized
    Serialization(String),

    // 500 Internal Server Error: view resolution failed
    View(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound(_) => 404,
            AppError::Serialization(_) => 500,
            AppError::View(_) => 500,
            AppError::InternalServerError(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound(msg) => msg,
            AppError::Serialization(msg) => msg,
            AppError::View(msg) => msg,
            AppError::InternalServerError(msg) => msg,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::View(_) => "VIEW_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Plain-text body emitted on every rendering mode unless error envelopes are enabled
    pub fn to_text(&self) -> String {
        match self {
            AppError::NotFound(path) => format!("Resource not found: {}\n", path),
            other => format!("Unhandled error ({}):\n{}\n", other.error_code(), other.message()),
        }
    }
}

impl AppError {
    pub fn not_found(path: impl Into<String>) -> Self {
        AppError::NotFound(path.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        AppError::Serialization(message.into())
    }

    pub fn view(message: impl Into<String>) -> Self {
        AppError::View(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        AppError::InternalServerError(message.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Page object serialization error: {}", err);
        AppError::serialization(format!("page object serialization failed: {}", err))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        tracing::error!("Session store error: {}", err);
        AppError::internal_server_error(err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        tracing::error!("User directory error: {}", err);
        AppError::internal_server_error(err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

/// Attached to every error response so outer middleware can re-render it
#[derive(Debug, Clone)]
pub struct ErrorReport(pub AppError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self.message());
        }

        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_text(),
        )
            .into_response();
        response.extensions_mut().insert(ErrorReport(self));
        response
    }
}
