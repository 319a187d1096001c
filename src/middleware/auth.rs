// Roles, session identity and the cookie names carrying session tokens
//
// Each role has its own cookie so a browser can hold a customer and a
// restaurant session side by side. The configured cookie name and the legacy
// shared name are still honored on the read path for sessions issued before
// the split.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app_config::AppConfig;

pub const SESSION_COOKIE_USER: &str = "nearbite_user_session";
pub const SESSION_COOKIE_RESTAURANT: &str = "nearbite_restaurant_session";
pub const SESSION_COOKIE_ADMIN: &str = "nearbite_admin_session";
pub const LEGACY_SESSION_COOKIE_NAME: &str = "nearbite_session";

/// Per-role cookie names in token resolution priority order
pub const SESSION_COOKIE_NAMES: [&str; 3] = [
    SESSION_COOKIE_USER,
    SESSION_COOKIE_RESTAURANT,
    SESSION_COOKIE_ADMIN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Restaurant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Restaurant => "restaurant",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved identity attached to authenticated requests.
/// `user_id` is a uuid string for user/restaurant roles and the literal
/// "admin" for the static admin identity.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub role: Role,
}

pub fn session_cookie_name(role: Role) -> &'static str {
    match role {
        Role::User => SESSION_COOKIE_USER,
        Role::Restaurant => SESSION_COOKIE_RESTAURANT,
        Role::Admin => SESSION_COOKIE_ADMIN,
    }
}

/// All cookie names a session token may live under, deduplicated, in the
/// order they are consulted.
pub fn all_session_cookie_names(config: &AppConfig) -> Vec<String> {
    let mut names: Vec<String> = SESSION_COOKIE_NAMES
        .iter()
        .map(|name| name.to_string())
        .collect();
    names.push(config.session_cookie_name.clone());
    names.push(LEGACY_SESSION_COOKIE_NAME.to_string());

    let mut seen = std::collections::HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
    names
}
