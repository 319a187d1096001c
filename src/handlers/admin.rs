// Admin review routes over restaurant applications

use axum::extract::{Path, State};
use diesel_async::AsyncPgConnection;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::models::{
    find_restaurant_by_id, list_restaurant_applications, review_restaurant_application,
    RestaurantStatus,
};
use crate::utils::{
    validation::{invalid_payload, trim_optional_field},
    ApiError, Json, Query, ValidationIssue,
};

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<String>,
}

/// GET /admin/applications
#[instrument(skip(state))]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match RestaurantStatus::from_str(raw) {
            Ok(status) if status != RestaurantStatus::Draft => Some(status),
            _ => {
                return Err(ApiError::validation(
                    "Invalid query",
                    vec![ValidationIssue {
                        path: "status".to_string(),
                        message: "Expected pending, approved or rejected".to_string(),
                    }],
                ));
            },
        },
    };

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to list applications"))?;

    let applications = list_restaurant_applications(&mut conn, status).await?;
    Ok(Json(json!({ "applications": applications })))
}

fn parse_restaurant_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Application not found"))
}

/// Existence and state checks run before anything else, so a request against
/// a missing or already-decided application gets 404/409 regardless of what
/// else is wrong with it.
async fn ensure_pending(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
    decision: RestaurantStatus,
) -> Result<(), ApiError> {
    let existing = find_restaurant_by_id(conn, restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    if existing.status() != RestaurantStatus::Pending {
        let message = match decision {
            RestaurantStatus::Approved => "Only pending applications can be approved.",
            _ => "Only pending applications can be rejected.",
        };
        return Err(ApiError::conflict(message));
    }
    Ok(())
}

async fn finish_review(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
    decision: RestaurantStatus,
    reason: Option<&str>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant = review_restaurant_application(conn, restaurant_id, decision, reason)
        .await?
        .ok_or_else(|| ApiError::conflict("Application is no longer pending."))?;

    info!(restaurant_id = %restaurant_id, decision = %decision, "application reviewed");
    Ok(Json(json!({ "restaurant": restaurant })))
}

/// POST /admin/applications/{id}/approve
#[instrument(skip(state))]
pub async fn approve_application(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = parse_restaurant_id(&restaurant_id)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to review application"))?;

    ensure_pending(&mut conn, restaurant_id, RestaurantStatus::Approved).await?;
    finish_review(&mut conn, restaurant_id, RestaurantStatus::Approved, None).await
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectApplicationRequest {
    #[validate(length(min = 3, max = 500, message = "Reason must be 3-500 characters"))]
    pub reason: Option<String>,
}

/// POST /admin/applications/{id}/reject
#[instrument(skip(state, payload))]
pub async fn reject_application(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    payload: Option<Json<RejectApplicationRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = parse_restaurant_id(&restaurant_id)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to review application"))?;

    ensure_pending(&mut conn, restaurant_id, RestaurantStatus::Rejected).await?;

    let mut payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.reason = trim_optional_field(payload.reason.as_ref());
    payload.validate().map_err(|e| invalid_payload(&e))?;

    finish_review(
        &mut conn,
        restaurant_id,
        RestaurantStatus::Rejected,
        payload.reason.as_deref(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_application_id_is_not_found() {
        let err = parse_restaurant_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        assert!(parse_restaurant_id("0a1b2c3d-0000-4000-8000-000000000001").is_ok());
    }

    #[test]
    fn test_reject_payload_reason_bounds() {
        let payload = RejectApplicationRequest { reason: None };
        assert!(payload.validate().is_ok());

        let payload = RejectApplicationRequest {
            reason: Some("Documents are unreadable".to_string()),
        };
        assert!(payload.validate().is_ok());

        let payload = RejectApplicationRequest {
            reason: Some("no".to_string()),
        };
        assert!(payload.validate().is_err());

        let payload = RejectApplicationRequest {
            reason: Some("x".repeat(501)),
        };
        assert!(payload.validate().is_err());
    }
}
