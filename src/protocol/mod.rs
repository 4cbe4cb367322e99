//! Server-driven single-page-app bridge.
//!
//! A controller calls [`PageRenderer::render`] once; the marker header decides
//! whether the client gets the page object as JSON or an HTML shell embedding it.

pub mod headers;
pub mod render;
pub mod shared;
pub mod view;

pub use headers::{
    classify, negotiate, HeaderAccess, Negotiated, NormalizedHeaders, RequestClassification,
    RequestView, JSON_MEDIA_TYPE,
};
pub use render::{PageRenderer, PendingView, ProtocolResponse, RenderContext, NO_STORE};
pub use shared::{project_user, SharedStateProvider};
pub use view::{HtmlShell, ViewResolver};
