// Authentication routes: OTP throttling, Firebase session exchange, static
// admin login, identity echo and logout.
//
// Session tokens travel in per-role cookies. Issuing a session for one role
// clears the cookies of the other roles so a browser never carries two
// conflicting identities for the same role family.

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::client_ip;
use crate::app::AppState;
use crate::app_config::{config, CookieSameSite};
use crate::middleware::auth::{all_session_cookie_names, session_cookie_name, Role};
use crate::middleware::auth_middleware::collect_session_tokens;
use crate::middleware::AuthSession;
use crate::models::{
    find_restaurant_by_id, find_user_by_id, find_user_location, upsert_restaurant_by_phone,
    upsert_user_by_phone, RestaurantStatus,
};
use crate::services::{FirebaseError, RateLimitOptions, SessionPayload};
use crate::utils::{validation::invalid_payload, ApiError, Json};

lazy_static! {
    static ref INDIAN_PHONE_REGEX: Regex = Regex::new(r"^\+91[6-9]\d{9}$").unwrap();
}

fn auth_limit_options() -> RateLimitOptions {
    let config = config();
    RateLimitOptions {
        window_seconds: config.auth_rate_limit_window_seconds as u64,
        max_attempts: config.auth_rate_limit_max_attempts as u64,
    }
}

fn otp_limit_options() -> RateLimitOptions {
    let config = config();
    RateLimitOptions {
        window_seconds: config.otp_rate_limit_window_seconds as u64,
        max_attempts: config.otp_rate_limit_max_attempts as u64,
    }
}

fn cookie_same_site() -> SameSite {
    match config().session_cookie_same_site {
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::None => SameSite::None,
    }
}

fn base_cookie(name: String, value: String) -> Cookie<'static> {
    let config = config();
    let mut builder = Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .same_site(cookie_same_site())
        .secure(config.session_cookie_secure);
    if let Some(domain) = &config.session_cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

fn session_cookie(role: Role, token: &str, ttl_seconds: u64) -> Cookie<'static> {
    let mut cookie = base_cookie(session_cookie_name(role).to_string(), token.to_string());
    cookie.set_max_age(time::Duration::seconds(ttl_seconds as i64));
    cookie
}

fn removal_cookie(name: String) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Expire every session cookie except the one belonging to `keep`.
fn clear_session_cookies(mut jar: CookieJar, keep: Option<Role>) -> CookieJar {
    let keep_name = keep.map(session_cookie_name);
    for name in all_session_cookie_names(config()) {
        if keep_name == Some(name.as_str()) {
            continue;
        }
        jar = jar.add(removal_cookie(name));
    }
    jar
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpRole {
    User,
    Restaurant,
}

impl OtpRole {
    fn as_str(&self) -> &'static str {
        match self {
            OtpRole::User => "user",
            OtpRole::Restaurant => "restaurant",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct OtpStartRequest {
    pub role: OtpRole,
    #[validate(regex(path = "INDIAN_PHONE_REGEX", message = "Invalid Indian phone number."))]
    pub phone: String,
}

/// POST /auth/otp/start
///
/// The OTP itself is issued client-side by Firebase; this endpoint only
/// validates the phone number and throttles per (role, phone, ip).
#[instrument(skip(state, payload))]
pub async fn otp_start(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(mut payload): Json<OtpStartRequest>,
) -> Result<Response, ApiError> {
    payload.phone = payload.phone.trim().to_string();
    payload.validate().map_err(|e| invalid_payload(&e))?;

    let ip = client_ip(&headers, &addr);
    let limit_key = format!("otp:start:{}:{}:{}", payload.role.as_str(), payload.phone, ip);
    let limit = state
        .rate_limiter
        .apply(&limit_key, otp_limit_options())
        .await
        .map_err(|_| ApiError::internal("Failed to validate OTP request"))?;

    if !limit.allowed {
        return Err(ApiError::RateLimited {
            message: "Too many OTP attempts. Please try again in a minute.".to_string(),
            retry_after_seconds: limit.reset_in_seconds,
        });
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[serde(rename = "idToken")]
    #[validate(length(min = 1, message = "ID token is required"))]
    pub id_token: String,
    pub role: Role,
}

/// POST /auth/session
///
/// Exchange a Firebase phone-auth ID token for a NearBite session. Upserts
/// the account row keyed by phone and reports the onboarding step the client
/// should route to.
#[instrument(skip(state, jar, payload))]
pub async fn create_session(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers, &addr);
    let limit = state
        .rate_limiter
        .apply(&format!("auth:session:{}", ip), auth_limit_options())
        .await
        .map_err(|_| ApiError::internal("Failed to create session"))?;

    if !limit.allowed {
        return Err(ApiError::RateLimited {
            message: "Too many authentication attempts. Please try again later.".to_string(),
            retry_after_seconds: limit.reset_in_seconds,
        });
    }

    payload.validate().map_err(|e| invalid_payload(&e))?;

    if payload.role == Role::Admin {
        return Err(ApiError::bad_request("Admin must use admin login."));
    }

    let verified = state
        .firebase_auth
        .verify_id_token(&payload.id_token)
        .await
        .map_err(|e| match e {
            FirebaseError::InvalidToken(_) | FirebaseError::MissingKey(_) => {
                ApiError::unauthorized("Invalid Firebase token")
            },
            other => {
                warn!("token verification failed: {}", other);
                ApiError::internal("Failed to create session")
            },
        })?;

    // Phone-auth tokens normally carry the number; fall back to an account
    // lookup for tokens minted through other flows.
    let phone = match verified.phone_number {
        Some(phone) => phone,
        None => state
            .firebase_auth
            .lookup_phone_number(&verified.uid)
            .await
            .ok_or_else(|| ApiError::bad_request("Firebase token missing phone number."))?,
    };

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to create session"))?;

    let (user_id, next_step, application_status) = match payload.role {
        Role::User => {
            let user_id = upsert_user_by_phone(&mut conn, &phone, &verified.uid).await?;
            let user = find_user_by_id(&mut conn, user_id).await?;
            let location = find_user_location(&mut conn, user_id).await?;
            let complete = user
                .as_ref()
                .map(|u| u.is_profile_complete(location.as_ref()))
                .unwrap_or(false);
            let next_step = if complete {
                "user_dashboard"
            } else {
                "user_onboarding"
            };
            (user_id, next_step, None)
        },
        Role::Restaurant => {
            let restaurant_id = upsert_restaurant_by_phone(&mut conn, &phone, &verified.uid).await?;
            let restaurant = find_restaurant_by_id(&mut conn, restaurant_id).await?;

            let (next_step, status) = match restaurant {
                Some(restaurant) => {
                    let status = restaurant.status();
                    let next_step = if !restaurant.has_profile() || !restaurant.has_location() {
                        "restaurant_onboarding"
                    } else {
                        match status {
                            RestaurantStatus::Approved => "restaurant_dashboard",
                            RestaurantStatus::Pending | RestaurantStatus::Rejected => {
                                "restaurant_application_status"
                            },
                            RestaurantStatus::Draft => "restaurant_onboarding",
                        }
                    };
                    (next_step, Some(status.as_str().to_string()))
                },
                None => ("restaurant_onboarding", None),
            };
            (restaurant_id, next_step, status)
        },
        Role::Admin => unreachable!("admin rejected above"),
    };

    let session = state
        .sessions
        .create(&SessionPayload {
            user_id: user_id.to_string(),
            role: payload.role,
        })
        .await
        .map_err(|_| ApiError::internal("Failed to create session"))?;

    info!(role = %payload.role, "session created");

    let jar = clear_session_cookies(jar, Some(payload.role)).add(session_cookie(
        payload.role,
        &session.session_id,
        session.ttl_seconds,
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "role": payload.role,
            "userId": user_id,
            "phone": phone,
            "nextStep": next_step,
            "applicationStatus": application_status,
        })),
    )
        .into_response())
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /auth/admin/login
///
/// Static credential check in constant time; there is exactly one admin
/// identity and it has no database row.
#[instrument(skip(state, jar, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Response, ApiError> {
    let ip = client_ip(&headers, &addr);
    let limit = state
        .rate_limiter
        .apply(&format!("auth:admin:{}", ip), auth_limit_options())
        .await
        .map_err(|_| ApiError::internal("Failed to login admin"))?;

    if !limit.allowed {
        return Err(ApiError::RateLimited {
            message: "Too many authentication attempts. Please try again later.".to_string(),
            retry_after_seconds: limit.reset_in_seconds,
        });
    }

    payload.validate().map_err(|e| invalid_payload(&e))?;

    let config = config();
    let email_ok = payload
        .email
        .as_bytes()
        .ct_eq(config.admin_email.as_bytes());
    let password_ok = payload
        .password
        .as_bytes()
        .ct_eq(config.admin_password.as_bytes());
    if !bool::from(email_ok & password_ok) {
        return Err(ApiError::unauthorized("Invalid admin credentials"));
    }

    let session = state
        .sessions
        .create(&SessionPayload {
            user_id: "admin".to_string(),
            role: Role::Admin,
        })
        .await
        .map_err(|_| ApiError::internal("Failed to login admin"))?;

    info!("admin session created");

    let jar = clear_session_cookies(jar, Some(Role::Admin)).add(session_cookie(
        Role::Admin,
        &session.session_id,
        session.ttl_seconds,
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({ "role": "admin", "userId": "admin" })),
    )
        .into_response())
}

/// GET /auth/me
pub async fn me(session: AuthSession) -> Json<serde_json::Value> {
    Json(json!({ "userId": session.user_id, "role": session.role }))
}

/// POST /auth/logout
///
/// Deletes every session token the request presented, under any cookie name
/// or the bearer header, then expires all session cookies.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    _session: AuthSession,
) -> Result<Response, ApiError> {
    for token in collect_session_tokens(&headers, &jar) {
        state
            .sessions
            .delete(&token)
            .await
            .map_err(|_| ApiError::internal("Failed to logout"))?;
    }

    let jar = clear_session_cookies(jar, None);
    Ok((StatusCode::NO_CONTENT, jar).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_regex_accepts_valid_indian_mobiles() {
        for phone in ["+916000000001", "+919876543210", "+917123456789"] {
            assert!(INDIAN_PHONE_REGEX.is_match(phone), "{} should match", phone);
        }
    }

    #[test]
    fn test_phone_regex_rejects_invalid_numbers() {
        for phone in [
            "+915000000001",
            "9876543210",
            "+91987654321",
            "+9198765432100",
            "+1 555 0100",
            "",
        ] {
            assert!(!INDIAN_PHONE_REGEX.is_match(phone), "{} should not match", phone);
        }
    }

    #[test]
    fn test_otp_start_payload_validation() {
        let payload = OtpStartRequest {
            role: OtpRole::User,
            phone: "+919876543210".to_string(),
        };
        assert!(payload.validate().is_ok());

        let payload = OtpStartRequest {
            role: OtpRole::Restaurant,
            phone: "12345".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
