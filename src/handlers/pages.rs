// Page routes: each answers with one component through the renderer

use super::context::PageContext;
use crate::error::AppError;
use crate::protocol::ProtocolResponse;
use crate::types::Props;

/// GET /
pub async fn welcome(page: PageContext) -> Result<ProtocolResponse, AppError> {
    page.render("Welcome", &Props::new()).await
}

/// GET /dashboard (signed-in users only)
pub async fn dashboard(page: PageContext) -> Result<ProtocolResponse, AppError> {
    if !page.signed_in() {
        return Ok(ProtocolResponse::redirect("/login"));
    }
    page.render("Dashboard", &Props::new()).await
}

/// GET /users/create (signed-in users only)
pub async fn users_create(page: PageContext) -> Result<ProtocolResponse, AppError> {
    if !page.signed_in() {
        return Ok(ProtocolResponse::redirect("/login"));
    }
    page.render("Users/Create", &Props::new()).await
}

/// GET /login
pub async fn login(page: PageContext) -> Result<ProtocolResponse, AppError> {
    tracing::debug!("Rendering login page");
    page.render("Auth/Login", &Props::new()).await
}

/// GET /register
pub async fn register(page: PageContext) -> Result<ProtocolResponse, AppError> {
    page.render("Auth/Register", &Props::new()).await
}
