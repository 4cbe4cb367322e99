use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::protocol::RequestView;

/// Classifies the request and publishes a normalized, read-only view of it.
/// The request's own headers are left exactly as received.
pub async fn request_view_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let view = RequestView::new(
        request.headers().clone(),
        request.uri().path(),
        &state.config.protocol.marker_header,
    );

    tracing::trace!(
        "{} {} classified as {:?}",
        request.method(),
        view.path(),
        view.classification()
    );

    request.extensions_mut().insert(view);
    next.run(request).await
}
