pub mod auth;
pub mod auth_middleware;
pub mod cors;

pub use auth::{
    session_cookie_name, AuthSession, Role, LEGACY_SESSION_COOKIE_NAME, SESSION_COOKIE_NAMES,
};
pub use auth_middleware::{
    auth_middleware, no_store_middleware, require_admin, require_restaurant, require_user,
};
pub use cors::cors_middleware;
