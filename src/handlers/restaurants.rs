// Restaurant onboarding and application routes
//
// The submit flow gives specific errors for each non-submittable state
// before attempting the guarded update, and still treats a zero-row update
// as a conflict in case the state changed between the read and the write.

use axum::extract::{Multipart, State};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::middleware::AuthSession;
use crate::models::{
    find_restaurant_by_id, submit_restaurant_application, update_restaurant_location,
    update_restaurant_profile, RestaurantStatus,
};
use crate::services::DocumentError;
use crate::utils::{
    validation::{invalid_payload, trim_optional_field},
    ApiError, Json, ValidationIssue,
};

const MAX_DOCUMENT_SIZE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_DOCUMENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "application/pdf"];

fn restaurant_uuid(session: &AuthSession) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&session.user_id).map_err(|_| ApiError::unauthorized("Unauthorized"))
}

/// GET /restaurants/me
#[instrument(skip(state, session))]
pub async fn get_me(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to load restaurant"))?;

    let restaurant = find_restaurant_by_id(&mut conn, restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    Ok(Json(json!({
        "restaurant": restaurant,
        "isProfileComplete": restaurant.has_profile(),
        "isLocationSet": restaurant.has_location(),
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRestaurantProfileRequest {
    #[serde(rename = "ownerName")]
    #[validate(length(min = 2, max = 120, message = "Owner name must be 2-120 characters"))]
    pub owner_name: String,
    #[serde(rename = "hotelName")]
    #[validate(length(min = 2, max = 180, message = "Restaurant name must be 2-180 characters"))]
    pub hotel_name: String,
    #[serde(rename = "fssaiNumber")]
    #[validate(length(min = 4, max = 50, message = "FSSAI number must be 4-50 characters"))]
    pub fssai_number: Option<String>,
    #[serde(rename = "photoUrl")]
    #[validate(url(message = "Invalid document photo URL"))]
    pub photo_url: Option<String>,
}

impl UpdateRestaurantProfileRequest {
    fn normalize(&mut self) {
        self.owner_name = self.owner_name.trim().to_string();
        self.hotel_name = self.hotel_name.trim().to_string();
        if let Some(fssai) = &self.fssai_number {
            self.fssai_number = Some(fssai.trim().to_string());
        }
        if let Some(url) = &self.photo_url {
            self.photo_url = Some(url.trim().to_string());
        }
    }
}

/// PATCH /restaurants/me/profile
#[instrument(skip(state, session, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: AuthSession,
    Json(mut payload): Json<UpdateRestaurantProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;
    payload.normalize();
    payload.validate().map_err(|e| invalid_payload(&e))?;

    // At least one verification artifact is required
    if payload.fssai_number.is_none() && payload.photo_url.is_none() {
        return Err(ApiError::validation(
            "Invalid payload",
            vec![ValidationIssue {
                path: "fssaiNumber".to_string(),
                message: "Provide either a valid FSSAI number or a document photo URL.".to_string(),
            }],
        ));
    }

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to update restaurant profile"))?;

    let restaurant = update_restaurant_profile(
        &mut conn,
        restaurant_id,
        &payload.owner_name,
        &payload.hotel_name,
        payload.fssai_number.as_deref(),
        payload.photo_url.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    Ok(Json(json!({ "restaurant": restaurant })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRestaurantLocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: f64,
    #[validate(length(min = 3, max = 300, message = "Address must be 3-300 characters"))]
    pub address: Option<String>,
}

/// PUT /restaurants/me/location
#[instrument(skip(state, session, payload))]
pub async fn update_location(
    State(state): State<AppState>,
    session: AuthSession,
    Json(mut payload): Json<UpdateRestaurantLocationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;
    payload.address = trim_optional_field(payload.address.as_ref());
    payload.validate().map_err(|e| invalid_payload(&e))?;

    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to update restaurant location"))?;

    let restaurant = update_restaurant_location(
        &mut conn,
        restaurant_id,
        payload.lat,
        payload.lng,
        payload.address.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    Ok(Json(json!({ "restaurant": restaurant })))
}

/// POST /restaurants/me/document
///
/// Multipart upload of a verification document (FSSAI license scan or a
/// storefront photo). 5 MiB ceiling, image/pdf types only.
#[instrument(skip(state, session, multipart))]
pub async fn upload_document(
    State(state): State<AppState>,
    session: AuthSession,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;

    let mut file: Option<(Vec<u8>, String, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Invalid document upload request."))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::bad_request("Document must be 5MB or smaller."))?;
        file = Some((bytes.to_vec(), content_type, file_name));
        break;
    }

    let Some((bytes, content_type, file_name)) = file else {
        return Err(ApiError::bad_request("Document file is required."));
    };

    if bytes.len() > MAX_DOCUMENT_SIZE_BYTES {
        return Err(ApiError::bad_request("Document must be 5MB or smaller."));
    }

    if !ALLOWED_DOCUMENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::bad_request(
            "Only JPG, PNG, WEBP, or PDF files are allowed.",
        ));
    }

    let uploaded = state
        .documents
        .upload(&restaurant_id, &bytes, &content_type, &file_name)
        .await
        .map_err(|e| {
            warn!("document upload failed: {}", e);
            match e {
                DocumentError::BucketNotFound => ApiError::internal(
                    "Document storage bucket not found. Check FIREBASE_STORAGE_BUCKET (commonly <project-id>.appspot.com).",
                ),
                DocumentError::PermissionDenied => ApiError::internal(
                    "Document upload permission denied for Firebase service account.",
                ),
                _ => ApiError::internal("Failed to upload document."),
            }
        })?;

    Ok(Json(json!({
        "url": uploaded.download_url,
        "path": uploaded.object_path,
    })))
}

/// POST /restaurants/me/application/submit
#[instrument(skip(state, session))]
pub async fn submit_application(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to submit application"))?;

    let current = find_restaurant_by_id(&mut conn, restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    if !current.has_profile() || !current.has_location() {
        return Err(ApiError::bad_request(
            "Complete profile and location before submitting application.",
        ));
    }

    match current.status() {
        RestaurantStatus::Approved => {
            return Err(ApiError::bad_request("Restaurant is already approved."));
        },
        RestaurantStatus::Pending => {
            return Err(ApiError::conflict("Application is already under review."));
        },
        RestaurantStatus::Draft | RestaurantStatus::Rejected => {},
    }

    let restaurant = submit_restaurant_application(&mut conn, restaurant_id)
        .await?
        .ok_or_else(|| {
            ApiError::conflict("Application cannot be submitted in current state.")
        })?;

    Ok(Json(json!({ "restaurant": restaurant })))
}

/// GET /restaurants/me/application
#[instrument(skip(state, session))]
pub async fn get_application(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let restaurant_id = restaurant_uuid(&session)?;
    let mut conn = state
        .diesel_pool
        .get()
        .await
        .map_err(|_| ApiError::internal("Failed to load application"))?;

    let restaurant = find_restaurant_by_id(&mut conn, restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant not found"))?;

    Ok(Json(json!({
        "status": restaurant.status,
        "reason": restaurant.review_reason,
        "submittedAt": restaurant.application_submitted_at,
        "reviewedAt": restaurant.application_reviewed_at,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_payload_requires_verification_artifact() {
        let mut payload = UpdateRestaurantProfileRequest {
            owner_name: "Ravi".to_string(),
            hotel_name: "Spice Garden".to_string(),
            fssai_number: None,
            photo_url: None,
        };
        payload.normalize();
        assert!(payload.validate().is_ok());
        // The either-or rule is applied after field validation
        assert!(payload.fssai_number.is_none() && payload.photo_url.is_none());
    }

    #[test]
    fn test_profile_payload_field_bounds() {
        let payload = UpdateRestaurantProfileRequest {
            owner_name: "R".to_string(),
            hotel_name: "Spice Garden".to_string(),
            fssai_number: Some("12345".to_string()),
            photo_url: None,
        };
        assert!(payload.validate().is_err());

        let payload = UpdateRestaurantProfileRequest {
            owner_name: "Ravi".to_string(),
            hotel_name: "Spice Garden".to_string(),
            fssai_number: Some("123".to_string()),
            photo_url: None,
        };
        assert!(payload.validate().is_err());

        let payload = UpdateRestaurantProfileRequest {
            owner_name: "Ravi".to_string(),
            hotel_name: "Spice Garden".to_string(),
            fssai_number: None,
            photo_url: Some("not a url".to_string()),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_allowed_document_types() {
        assert!(ALLOWED_DOCUMENT_TYPES.contains(&"image/jpeg"));
        assert!(ALLOWED_DOCUMENT_TYPES.contains(&"application/pdf"));
        assert!(!ALLOWED_DOCUMENT_TYPES.contains(&"image/gif"));
        assert!(!ALLOWED_DOCUMENT_TYPES.contains(&"text/html"));
    }
}
