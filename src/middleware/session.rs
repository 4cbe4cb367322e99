use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::session::{CookieChange, Principal, Session};

/// Loads the client's session (if its cookie names a live one) and the
/// principal stored in it, then issues or clears the cookie on the way out.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.as_str();

    let session = match session_cookie(request.headers(), cookie_name) {
        Some(id) => match state.sessions.exists(&id).await {
            Ok(true) => Session::existing(state.sessions.clone(), id),
            Ok(false) => {
                tracing::debug!("Ignoring unknown session id from cookie");
                Session::fresh(state.sessions.clone())
            }
            Err(e) => {
                tracing::warn!("Session store lookup failed: {}", e);
                Session::fresh(state.sessions.clone())
            }
        },
        None => Session::fresh(state.sessions.clone()),
    };

    let principal = Principal::from_session(&session).await;

    request.extensions_mut().insert(session.clone());
    request.extensions_mut().insert(principal);

    let mut response = next.run(request).await;

    if let Some(change) = session.cookie_change() {
        let value = set_cookie(cookie_name, &change, state.config.session.secure_cookie);
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                response.headers_mut().append(header::SET_COOKIE, v);
            }
            Err(e) => tracing::error!("Failed to encode session cookie: {}", e),
        }
    }

    response
}

pub fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn set_cookie(cookie_name: &str, change: &CookieChange, secure: bool) -> String {
    let mut cookie = match change {
        CookieChange::Issue(id) => format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cookie_name, id),
        CookieChange::Clear => format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", cookie_name),
    };
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; SESSION=abc123; other=1"),
        );
        assert_eq!(session_cookie(&headers, "SESSION").as_deref(), Some("abc123"));
        assert_eq!(session_cookie(&headers, "MISSING"), None);
    }

    #[test]
    fn empty_cookie_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("SESSION="));
        assert_eq!(session_cookie(&headers, "SESSION"), None);
    }

    #[test]
    fn formats_issue_and_clear() {
        assert_eq!(
            set_cookie("SESSION", &CookieChange::Issue("abc".into()), false),
            "SESSION=abc; Path=/; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            set_cookie("SESSION", &CookieChange::Clear, true),
            "SESSION=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax; Secure"
        );
    }
}
