use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::AppError;
use crate::protocol::{PageRenderer, ProtocolResponse, RenderContext, RequestView};
use crate::session::{Principal, SecurityContext, Session, ANONYMOUS_PRINCIPAL};

/// Per-request render context handed to page handlers
pub struct PageContext {
    renderer: Arc<PageRenderer>,
    view: RequestView,
    session: Option<Session>,
    principal: Principal,
}

impl PageContext {
    pub async fn render<P: Serialize + ?Sized + Sync>(
        &self,
        component: &str,
        props: &P,
    ) -> Result<ProtocolResponse, AppError> {
        let ctx = RenderContext {
            view: &self.view,
            session: self.session.as_ref(),
            security: &self.principal,
        };
        self.renderer.render(&ctx, component, props).await
    }

    pub fn signed_in(&self) -> bool {
        self.principal.is_authenticated()
            && matches!(
                self.principal.current_principal_name(),
                Some(name) if name != ANONYMOUS_PRINCIPAL
            )
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Fall back to classifying here when the request-view layer is not installed
        let view = match parts.extensions.get::<RequestView>() {
            Some(view) => view.clone(),
            None => RequestView::from_parts(parts, &state.config.protocol.marker_header),
        };

        Ok(Self {
            renderer: state.renderer.clone(),
            view,
            session: parts.extensions.get::<Session>().cloned(),
            principal: parts
                .extensions
                .get::<Principal>()
                .cloned()
                .unwrap_or_else(Principal::none),
        })
    }
}
