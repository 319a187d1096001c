// Session resolution and role guards
//
// `auth_middleware` turns a bearer token or session cookie into an
// `AuthSession` request extension; the role guards and the `AuthSession`
// extractor then read it back out.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::auth::{all_session_cookie_names, AuthSession, Role};
use crate::app::AppState;
use crate::app_config::config;
use crate::utils::ApiError;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// First non-empty token across the cookie names, in priority order. An
/// empty cookie (as left behind by a logout removal) never shadows a later
/// populated one.
fn first_cookie_token(jar: &CookieJar, names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value().to_string())
        .find(|token| !token.is_empty())
}

fn cookie_token(jar: &CookieJar) -> Option<String> {
    first_cookie_token(jar, &all_session_cookie_names(config()))
}

/// Every distinct session token present on the request, bearer first.
/// Logout deletes all of them.
pub fn collect_session_tokens(headers: &HeaderMap, jar: &CookieJar) -> Vec<String> {
    let mut tokens = Vec::new();
    if let Some(token) = bearer_token(headers) {
        tokens.push(token);
    }
    for name in all_session_cookie_names(config()) {
        if let Some(cookie) = jar.get(&name) {
            let value = cookie.value().to_string();
            if !value.is_empty() {
                tokens.push(value);
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    tokens.retain(|token| seen.insert(token.clone()));
    tokens
}

/// Resolve the session token and attach `AuthSession` to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).or_else(|| cookie_token(&jar));

    let Some(token) = token else {
        return ApiError::unauthorized("Missing auth token").into_response();
    };

    let session = match state.sessions.get(&token).await {
        Ok(session) => session,
        Err(e) => {
            warn!("session lookup failed: {}", e);
            return ApiError::internal("Auth lookup failed").into_response();
        },
    };

    let Some(session) = session else {
        return ApiError::unauthorized("Invalid or expired session").into_response();
    };

    request.extensions_mut().insert(AuthSession {
        user_id: session.user_id,
        role: session.role,
    });

    next.run(request).await
}

async fn require_role(request: Request, next: Next, role: Role) -> Response {
    match request.extensions().get::<AuthSession>() {
        None => ApiError::unauthorized("Unauthorized").into_response(),
        Some(session) if session.role != role => {
            ApiError::Forbidden("Forbidden".to_string()).into_response()
        },
        Some(_) => next.run(request).await,
    }
}

pub async fn require_user(request: Request, next: Next) -> Response {
    require_role(request, next, Role::User).await
}

pub async fn require_restaurant(request: Request, next: Next) -> Response {
    require_role(request, next, Role::Restaurant).await
}

pub async fn require_admin(request: Request, next: Next) -> Response {
    require_role(request, next, Role::Admin).await
}

/// Authenticated responses must not be cached by intermediaries
pub async fn no_store_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123 "));
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_missing_header_yields_no_token() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_empty_cookie_does_not_shadow_later_one() {
        let names = vec![
            "nearbite_user_session".to_string(),
            "nearbite_restaurant_session".to_string(),
            "nearbite_session".to_string(),
        ];
        let jar = CookieJar::new()
            .add(Cookie::new("nearbite_user_session", ""))
            .add(Cookie::new("nearbite_restaurant_session", "token-r"));

        assert_eq!(
            first_cookie_token(&jar, &names),
            Some("token-r".to_string())
        );
    }

    #[test]
    fn test_cookie_priority_order_is_kept() {
        let names = vec![
            "nearbite_user_session".to_string(),
            "nearbite_session".to_string(),
        ];
        let jar = CookieJar::new()
            .add(Cookie::new("nearbite_session", "legacy"))
            .add(Cookie::new("nearbite_user_session", "token-u"));

        assert_eq!(
            first_cookie_token(&jar, &names),
            Some("token-u".to_string())
        );
    }

    #[test]
    fn test_all_empty_cookies_yield_no_token() {
        let names = vec!["nearbite_user_session".to_string()];
        let jar = CookieJar::new().add(Cookie::new("nearbite_user_session", ""));
        assert_eq!(first_cookie_token(&jar, &names), None);
    }
}
