use axum::http::Uri;

use crate::error::AppError;

/// Any unroutable path: plain-text 404 naming the path
pub async fn not_found(uri: Uri) -> AppError {
    tracing::debug!("No route for {}", uri.path());
    AppError::not_found(uri.path())
}
