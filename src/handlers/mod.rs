// Route handlers and router assembly per API scope

pub mod admin;
pub mod auth;
pub mod maps;
pub mod restaurants;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post, put};
use axum::Router;
use std::net::SocketAddr;

use crate::app::AppState;
use crate::middleware::{
    auth_middleware, no_store_middleware, require_admin, require_restaurant, require_user,
};

/// Multipart body ceiling for document uploads; slightly above the 5 MiB
/// document limit to leave room for multipart framing.
const DOCUMENT_BODY_LIMIT: usize = 6 * 1024 * 1024;

/// Client address for rate-limit keys. Behind the proxy the first
/// X-Forwarded-For hop is the real client.
pub(crate) fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/otp/start", post(auth::otp_start))
        .route("/session", post(auth::create_session))
        .route("/admin/login", post(auth::admin_login))
        .merge(protected)
        .layer(from_fn(no_store_middleware))
}

pub fn users_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(users::get_me))
        .route("/me/profile", patch(users::update_profile))
        .route("/me/location", put(users::update_location))
        .layer(from_fn(no_store_middleware))
        .layer(from_fn(require_user))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
}

pub fn restaurants_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(restaurants::get_me))
        .route("/me/profile", patch(restaurants::update_profile))
        .route("/me/location", put(restaurants::update_location))
        .route(
            "/me/document",
            post(restaurants::upload_document).layer(DefaultBodyLimit::max(DOCUMENT_BODY_LIMIT)),
        )
        .route(
            "/me/application/submit",
            post(restaurants::submit_application),
        )
        .route("/me/application", get(restaurants::get_application))
        .layer(from_fn(no_store_middleware))
        .layer(from_fn(require_restaurant))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
}

pub fn maps_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/reverse-geocode", get(maps::reverse_geocode))
        .layer(from_fn(no_store_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
}

pub fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/applications", get(admin::list_applications))
        .route(
            "/applications/{restaurant_id}/approve",
            post(admin::approve_application),
        )
        .route(
            "/applications/{restaurant_id}/reject",
            post(admin::reject_application),
        )
        .layer(from_fn(no_store_middleware))
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
}
