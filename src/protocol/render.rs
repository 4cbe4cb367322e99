use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::headers::{RequestView, JSON_MEDIA_TYPE};
use super::shared::SharedStateProvider;
use crate::config::ProtocolConfig;
use crate::directory::UserLookup;
use crate::error::AppError;
use crate::session::{SecurityContext, Session};
use crate::types::{PageObject, Props};

pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Component rendered for error pages when error envelopes are enabled
pub const ERROR_COMPONENT: &str = "Error";

/// Everything a render needs to know about the current request
pub struct RenderContext<'a> {
    pub view: &'a RequestView,
    pub session: Option<&'a Session>,
    pub security: &'a dyn SecurityContext,
}

/// Serialized page object awaiting the HTML template layer
#[derive(Debug, Clone)]
pub struct PendingView {
    pub view: String,
    pub page: String,
}

#[derive(Debug)]
pub enum ProtocolResponse {
    /// Page object as the JSON body of a protocol response
    Json { marker: HeaderName, body: Vec<u8> },
    /// Named view plus the page object to embed in the bootstrap HTML
    View(PendingView),
    /// 303 See Other, followed by the client with a fresh GET
    Redirect(String),
}

impl ProtocolResponse {
    pub fn redirect(location: impl Into<String>) -> Self {
        ProtocolResponse::Redirect(location.into())
    }
}

impl IntoResponse for ProtocolResponse {
    fn into_response(self) -> Response {
        match self {
            ProtocolResponse::Json { marker, body } => json_page_response(StatusCode::OK, marker, body),
            ProtocolResponse::View(pending) => {
                // Body is filled in by the view-resolution middleware
                let mut response = (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                )
                    .into_response();
                response.extensions_mut().insert(pending);
                response
            }
            ProtocolResponse::Redirect(location) => match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response(),
                Err(_) => AppError::internal_server_error(format!(
                    "invalid redirect location: {}",
                    location
                ))
                .into_response(),
            },
        }
    }
}

fn json_page_response(status: StatusCode, marker: HeaderName, body: Vec<u8>) -> Response {
    let length = body.len();
    Response::builder()
        .status(status)
        .header(marker, "true")
        .header(header::VARY, "Accept")
        .header(header::CONTENT_TYPE, JSON_MEDIA_TYPE)
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, NO_STORE)
        .body(Body::from(body))
        .unwrap_or_else(|e| {
            AppError::internal_server_error(format!("failed to build page response: {}", e))
                .into_response()
        })
}

/// Single entry point controllers use to answer with a page
pub struct PageRenderer {
    shared: SharedStateProvider,
    protocol: ProtocolConfig,
    marker: HeaderName,
}

impl PageRenderer {
    pub fn new(lookup: Option<Arc<dyn UserLookup>>, protocol: ProtocolConfig) -> Result<Self, AppError> {
        let marker = HeaderName::from_bytes(protocol.marker_header.as_bytes()).map_err(|_| {
            AppError::internal_server_error(format!(
                "invalid protocol marker header name: {:?}",
                protocol.marker_header
            ))
        })?;

        Ok(Self {
            shared: SharedStateProvider::new(lookup),
            protocol,
            marker,
        })
    }

    /// Renders `component` with `props` plus the shared `auth` and `errors` props.
    ///
    /// `props` must serialize to a JSON object; anything else, or a value serde
    /// refuses to serialize, fails the request with a server error.
    pub async fn render<P: Serialize + ?Sized>(
        &self,
        ctx: &RenderContext<'_>,
        component: &str,
        props: &P,
    ) -> Result<ProtocolResponse, AppError> {
        let is_protocol = ctx.view.is_protocol();

        // Serializing copies the caller's data; their value is never touched
        let mut props: Props = match serde_json::to_value(props)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(AppError::serialization(format!(
                    "props must serialize to a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let auth = self.shared.resolve_auth(ctx.security).await;
        props.insert("auth".to_string(), serde_json::to_value(auth)?);

        if !props.contains_key("errors") {
            let errors = self.shared.resolve_and_clear_flash_errors(ctx.session).await;
            props.insert("errors".to_string(), Value::Object(errors));
        }

        let page = PageObject::new(component, props, ctx.view.path(), self.protocol.version.as_str());

        if is_protocol {
            tracing::debug!("Rendering {} as JSON page object for {}", component, page.url);
            let body = serde_json::to_vec(&page)?;
            return Ok(ProtocolResponse::Json {
                marker: self.marker.clone(),
                body,
            });
        }

        tracing::debug!("Rendering {} into view {} for {}", component, self.protocol.root_view, page.url);
        let page = serde_json::to_string(&page)?;
        Ok(ProtocolResponse::View(PendingView {
            view: self.protocol.root_view.clone(),
            page,
        }))
    }

    /// Minimal error page object for protocol requests, carrying the error's status
    ///
    /// Flash errors are left in the session for the next real page.
    pub async fn render_error(
        &self,
        view: &RequestView,
        security: &dyn SecurityContext,
        err: &AppError,
    ) -> Response {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let auth = match serde_json::to_value(self.shared.resolve_auth(security).await) {
            Ok(auth) => auth,
            Err(e) => return AppError::from(e).into_response(),
        };

        let mut props = Props::new();
        props.insert("status".to_string(), json!(status.as_u16()));
        props.insert("message".to_string(), json!(err.to_text().trim_end()));
        props.insert("auth".to_string(), auth);
        props.insert("errors".to_string(), json!({}));

        let page = PageObject::new(ERROR_COMPONENT, props, view.path(), self.protocol.version.as_str());
        match serde_json::to_vec(&page) {
            Ok(body) => json_page_response(status, self.marker.clone(), body),
            Err(e) => AppError::from(e).into_response(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
