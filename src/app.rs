use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::directory::{MemoryUserDirectory, UserLookup};
use crate::error::AppError;
use crate::handlers;
use crate::middleware;
use crate::protocol::{HtmlShell, PageRenderer, ViewResolver};
use crate::session::{MemorySessionStore, SessionStore};

/// Collaborators wired once at startup and shared read-only by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub renderer: Arc<PageRenderer>,
    pub users: Arc<dyn UserLookup>,
    pub sessions: Arc<dyn SessionStore>,
    pub views: Arc<dyn ViewResolver>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserLookup>,
        sessions: Arc<dyn SessionStore>,
        views: Arc<dyn ViewResolver>,
    ) -> Result<Self, AppError> {
        let renderer = PageRenderer::new(Some(users.clone()), config.protocol.clone())?;
        Ok(Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            users,
            sessions,
            views,
        })
    }

    /// Demo directory, process-local sessions and the built-in HTML shell
    pub fn in_memory(config: AppConfig) -> Result<Self, AppError> {
        let sessions = MemorySessionStore::with_idle_timeout(config.session.idle_timeout());
        Self::new(
            config,
            Arc::new(MemoryUserDirectory::demo()?),
            Arc::new(sessions),
            Arc::new(HtmlShell::new()),
        )
    }
}

pub fn router(state: AppState) -> Router {
    with_layers(routes(), state)
}

/// Every application route plus the 404 fallback, before the middleware stack
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(page_routes())
        .merge(auth_routes())
        .fallback(handlers::not_found)
}

/// Wraps `routes` in the request-view, session, error and view-resolution layers
pub fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    routes
        // Outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(from_fn_with_state(state.clone(), middleware::request_view_middleware))
                .layer(from_fn_with_state(state.clone(), middleware::session_middleware))
                .layer(from_fn_with_state(state.clone(), middleware::error_envelope_middleware))
                .layer(CatchPanicLayer::custom(middleware::handle_panic))
                .layer(from_fn_with_state(state.clone(), middleware::resolve_view_middleware)),
        )
        .with_state(state)
}

fn page_routes() -> Router<AppState> {
    use handlers::pages;

    Router::new()
        .route("/", get(pages::welcome))
        .route("/dashboard", get(pages::dashboard))
        .route("/users/create", get(pages::users_create))
        .route("/register", get(pages::register))
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/login", get(handlers::pages::login).post(auth::login))
        .route("/logout", post(auth::logout))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let mut allowed_headers = vec![header::CONTENT_TYPE, header::ACCEPT];
    if let Ok(marker) = HeaderName::from_bytes(config.protocol.marker_header.as_bytes()) {
        allowed_headers.push(marker);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(allowed_headers.clone())
        .expose_headers(allowed_headers)
        .allow_credentials(true)
}
