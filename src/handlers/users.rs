// Customer onboarding routes

use axum::extract::State;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::middleware::AuthSession;
use crate::models::{
    find_user_by_id, find_user_location, update_user_profile, upsert_user_location,
};
use crate::utils::{
    validation::{invalid_payload, trim_optional_field},
    ApiError, Json, ValidationIssue,
};

fn user_uuid(session: &AuthSession) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&session.user_id).map_err(|_| ApiError::unauthorized("Unauthorized"))
}

/// GET /users/me
#[instrument(skip(state, session))]
pub async fn get_me(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user_uuid(&session)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to load profile"))?;

    let user = find_user_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let location = find_user_location(&mut conn, user_id).await?;
    let complete = user.is_profile_complete(location.as_ref());

    Ok(Json(json!({
        "user": user,
        "location": location,
        "isProfileComplete": complete,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserProfileRequest {
    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl UpdateUserProfileRequest {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        if let Some(email) = &self.email {
            self.email = Some(email.trim().to_string());
        }
    }
}

/// PATCH /users/me/profile
#[instrument(skip(state, session, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: AuthSession,
    Json(mut payload): Json<UpdateUserProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user_uuid(&session)?;
    payload.normalize();
    payload.validate().map_err(|e| invalid_payload(&e))?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to update profile"))?;

    let user = update_user_profile(&mut conn, user_id, &payload.name, payload.email.as_deref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({ "user": user })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserLocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: f64,
    #[serde(rename = "accuracyM")]
    pub accuracy_m: Option<f64>,
    #[validate(length(min = 3, max = 300, message = "Address must be 3-300 characters"))]
    pub address: Option<String>,
}

/// PUT /users/me/location
#[instrument(skip(state, session, payload))]
pub async fn update_location(
    State(state): State<AppState>,
    session: AuthSession,
    Json(mut payload): Json<UpdateUserLocationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = user_uuid(&session)?;
    payload.address = trim_optional_field(payload.address.as_ref());
    payload.validate().map_err(|e| invalid_payload(&e))?;

    if matches!(payload.accuracy_m, Some(accuracy) if accuracy <= 0.0) {
        return Err(ApiError::validation(
            "Invalid payload",
            vec![ValidationIssue {
                path: "accuracyM".to_string(),
                message: "Accuracy must be positive".to_string(),
            }],
        ));
    }

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to update location"))?;

    let location = upsert_user_location(
        &mut conn,
        user_id,
        payload.lat,
        payload.lng,
        payload.accuracy_m,
        payload.address.as_deref(),
    )
    .await?;

    Ok(Json(json!({ "location": location })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_payload_bounds() {
        let mut payload = UpdateUserProfileRequest {
            name: "  Asha  ".to_string(),
            email: None,
        };
        payload.normalize();
        assert_eq!(payload.name, "Asha");
        assert!(payload.validate().is_ok());

        let payload = UpdateUserProfileRequest {
            name: "A".to_string(),
            email: None,
        };
        assert!(payload.validate().is_err());

        let payload = UpdateUserProfileRequest {
            name: "Asha".to_string(),
            email: Some("not-an-email".to_string()),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_location_payload_bounds() {
        let payload = UpdateUserLocationRequest {
            lat: 12.9716,
            lng: 77.5946,
            accuracy_m: Some(8.0),
            address: Some("MG Road, Bengaluru".to_string()),
        };
        assert!(payload.validate().is_ok());

        let payload = UpdateUserLocationRequest {
            lat: 91.0,
            lng: 77.5946,
            accuracy_m: None,
            address: None,
        };
        assert!(payload.validate().is_err());

        let payload = UpdateUserLocationRequest {
            lat: 12.9716,
            lng: -181.0,
            accuracy_m: None,
            address: None,
        };
        assert!(payload.validate().is_err());
    }
}
