mod common;

use anyhow::Result;
use axum::{http::StatusCode, routing::get, Router};
use serde_json::json;

use spa_bridge::app::{routes, with_layers};
use spa_bridge::config::AppConfig;
use spa_bridge::handlers::PageContext;
use spa_bridge::{AppError, AppState, ProtocolResponse};

async fn explode() -> &'static str {
    panic!("kaboom")
}

async fn list_as_props(page: PageContext) -> Result<ProtocolResponse, AppError> {
    page.render("Broken", &vec![1, 2, 3]).await
}

/// Full middleware stack plus two routes that fail in different ways
fn app_with_failing_routes(config: AppConfig) -> Router {
    let state = AppState::in_memory(config).expect("in-memory state");
    let routes = routes()
        .route("/explode", get(explode))
        .route("/broken", get(list_as_props));
    with_layers(routes, state)
}

const PANIC_TEXT: &str = "Unhandled error (INTERNAL_SERVER_ERROR):\nhandler panicked: kaboom\n";
const SERIALIZATION_TEXT: &str =
    "Unhandled error (SERIALIZATION_ERROR):\nprops must serialize to a JSON object, got an array\n";

#[tokio::test]
async fn unknown_paths_are_plain_text_404_in_both_modes() -> Result<()> {
    let app = common::app();

    for request in [
        common::get("/no/such/page", None),
        common::visit("/no/such/page", None),
    ] {
        let res = common::send(&app, request).await?;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res.header("content-type").unwrap_or("").starts_with("text/plain"));
        assert_eq!(res.body, "Resource not found: /no/such/page\n");
        assert!(res.header("x-inertia").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn error_envelopes_render_error_page_for_protocol_requests() -> Result<()> {
    let mut config = AppConfig::development();
    config.protocol.error_envelopes = true;
    let app = common::app_with(config);

    let res = common::send(&app, common::visit("/missing", None)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.header("x-inertia"), Some("true"));
    assert_eq!(res.header("content-type"), Some("application/json"));

    let page = res.json()?;
    assert_eq!(page["component"], json!("Error"));
    assert_eq!(page["url"], json!("/missing"));
    assert_eq!(page["props"]["status"], json!(404));
    assert_eq!(page["props"]["message"], json!("Resource not found: /missing"));
    assert_eq!(page["props"]["auth"], json!({ "user": null }));
    assert_eq!(page["props"]["errors"], json!({}));

    // full page loads still get text
    let res = common::send(&app, common::get("/missing", None)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, "Resource not found: /missing\n");
    Ok(())
}

#[tokio::test]
async fn custom_marker_header_is_detected_and_echoed() -> Result<()> {
    let mut config = AppConfig::development();
    config.protocol.marker_header = "X-Page-Nav".to_string();
    config.protocol.version = "build-42".to_string();
    let app = common::app_with(config);

    let request = axum::http::Request::get("/")
        .header("X-Page-Nav", "true")
        .body(axum::body::Body::empty())?;
    let res = common::send(&app, request).await?;

    assert_eq!(res.header("x-page-nav"), Some("true"));
    assert_eq!(res.json()?["version"], json!("build-42"));

    // the default marker means nothing here
    let res = common::send(&app, common::visit("/", None)).await?;
    assert!(res.header("content-type").unwrap_or("").starts_with("text/html"));
    Ok(())
}

#[tokio::test]
async fn stale_session_cookie_is_treated_as_no_session() -> Result<()> {
    let app = common::app();

    let res = common::send(&app, common::visit("/", Some("SESSION=does-not-exist"))).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()?["props"]["auth"], json!({ "user": null }));
    assert!(res.header("set-cookie").is_none());
    Ok(())
}

#[tokio::test]
async fn handler_panics_are_plain_text_500_in_both_modes() -> Result<()> {
    let app = app_with_failing_routes(AppConfig::development());

    for request in [common::get("/explode", None), common::visit("/explode", None)] {
        let res = common::send(&app, request).await?;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.header("content-type").unwrap_or("").starts_with("text/plain"));
        assert_eq!(res.body, PANIC_TEXT);
        assert!(res.header("x-inertia").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn unserializable_props_are_plain_text_500_in_both_modes() -> Result<()> {
    let app = app_with_failing_routes(AppConfig::development());

    for request in [common::get("/broken", None), common::visit("/broken", None)] {
        let res = common::send(&app, request).await?;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.header("content-type").unwrap_or("").starts_with("text/plain"));
        assert_eq!(res.body, SERIALIZATION_TEXT);
        assert!(res.header("x-inertia").is_none());
    }
    Ok(())
}

#[tokio::test]
async fn error_envelopes_cover_panics_and_serialization_failures() -> Result<()> {
    let mut config = AppConfig::development();
    config.protocol.error_envelopes = true;
    let app = app_with_failing_routes(config);

    let res = common::send(&app, common::visit("/explode", None)).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.header("x-inertia"), Some("true"));
    let page = res.json()?;
    assert_eq!(page["component"], json!("Error"));
    assert_eq!(page["props"]["status"], json!(500));

    let res = common::send(&app, common::visit("/broken", None)).await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()?["props"]["message"], json!(SERIALIZATION_TEXT.trim_end()));

    // full page loads still get text
    let res = common::send(&app, common::get("/explode", None)).await?;
    assert_eq!(res.body, PANIC_TEXT);
    Ok(())
}

#[tokio::test]
async fn error_page_reports_the_signed_in_user() -> Result<()> {
    let mut config = AppConfig::development();
    config.protocol.error_envelopes = true;
    let app = common::app_with(config);

    let res = common::send(
        &app,
        common::post_json(
            "/login",
            &json!({ "email": "admin@example.com", "password": "password" }),
            None,
        ),
    )
    .await?;
    let cookie = res.session_cookie().expect("session cookie issued");

    let res = common::send(&app, common::visit("/missing", Some(&cookie))).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let page = res.json()?;
    assert_eq!(page["component"], json!("Error"));
    assert_eq!(page["props"]["auth"]["user"]["email"], json!("admin@example.com"));
    assert_eq!(page["props"]["auth"]["user"]["rol_nombre"], json!("admin"));
    Ok(())
}
