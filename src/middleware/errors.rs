use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;

use crate::app::AppState;
use crate::error::{AppError, ErrorReport};
use crate::protocol::{Negotiated, RequestView};
use crate::session::Principal;

/// With error envelopes enabled, error answers follow the request's content
/// negotiation: clients negotiating JSON get a JSON body, everyone else keeps
/// the plain text. Negotiation reads the normalized `Accept`, so protocol
/// requests always land on JSON and receive an `Error` page object.
pub async fn error_envelope_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.protocol.error_envelopes {
        return next.run(request).await;
    }

    let view = request.extensions().get::<RequestView>().cloned();
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .unwrap_or_else(Principal::none);

    let response = next.run(request).await;
    let report = response.extensions().get::<ErrorReport>().cloned();

    match (view, report) {
        (Some(view), Some(ErrorReport(err))) if view.negotiated() == Negotiated::Json => {
            if view.is_protocol() {
                state.renderer.render_error(&view, &principal, &err).await
            } else {
                json_error(&view, &err)
            }
        }
        _ => response,
    }
}

/// Error body for plain API clients that asked for JSON
fn json_error(view: &RequestView, err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": true,
            "message": err.to_text().trim_end(),
            "code": err.error_code(),
            "path": view.path(),
        })),
    )
        .into_response()
}

/// Turns a handler panic into the same plain-text 500 as any other unhandled error
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal_server_error(format!("handler panicked: {}", detail)).into_response()
}
