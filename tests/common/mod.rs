#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use spa_bridge::config::AppConfig;
use spa_bridge::protocol::view::extract_page;
use spa_bridge::{router, AppState};

pub const MARKER: &str = "X-Inertia";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Page object embedded in an HTML shell
    pub fn embedded_page(&self) -> Result<Value> {
        let page = extract_page(&self.body)
            .ok_or_else(|| anyhow::anyhow!("no data-page attribute in body: {}", self.body))?;
        Ok(serde_json::from_str(&page)?)
    }

    /// `NAME=value` pair from Set-Cookie, ready to send back
    pub fn session_cookie(&self) -> Option<String> {
        self.header("set-cookie")
            .and_then(|c| c.split(';').next())
            .map(|pair| pair.trim().to_string())
    }
}

pub fn app() -> Router {
    app_with(AppConfig::development())
}

pub fn app_with(config: AppConfig) -> Router {
    let state = AppState::in_memory(config).expect("in-memory state");
    router(state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Result<TestResponse> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    Ok(TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec())?,
    })
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path).header(header::ACCEPT, "text/html");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

/// Client-side navigation: marker header set, browser-ish Accept
pub fn visit(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path)
        .header(MARKER, "true")
        .header(header::ACCEPT, "text/html, application/xhtml+xml");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_json(path: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path)
        .header(MARKER, "true")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn post_empty(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path).header(MARKER, "true");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}
