use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::protocol::PendingView;

/// Renders responses that carry a `PendingView` through the configured resolver
pub async fn resolve_view_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(pending) = response.extensions_mut().remove::<PendingView>() else {
        return response;
    };

    match state.views.resolve(&pending.view, &pending.page) {
        Ok(html) => {
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            headers.insert(header::VARY, HeaderValue::from_static("Accept"));
            headers.remove(header::CONTENT_LENGTH);
            *response.body_mut() = Body::from(html);
            response
        }
        Err(e) => e.into_response(),
    }
}
