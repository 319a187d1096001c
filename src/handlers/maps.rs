// Reverse geocoding route shared by all authenticated roles

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use crate::app::AppState;
use crate::middleware::AuthSession;
use crate::services::GeocodeError;
use crate::utils::{validation::collect_validation_issues, ApiError, Json, Query};

#[derive(Debug, Deserialize, Validate)]
pub struct ReverseGeocodeQuery {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub lng: f64,
}

/// GET /maps/reverse-geocode
#[instrument(skip(state, _session))]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Result<Response, ApiError> {
    query.validate().map_err(|e| {
        ApiError::validation("Invalid coordinates", collect_validation_issues(&e))
    })?;

    match state.geocode.reverse_geocode(query.lat, query.lng).await {
        Ok(result) => Ok(Json(json!({
            "address": result.address,
            "source": result.source.as_str(),
        }))
        .into_response()),
        Err(GeocodeError::Provider) => {
            Err(ApiError::UpstreamProvider("Geocoding provider error".to_string()))
        },
        Err(GeocodeError::NotFound { provider_status }) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "Address not found for these coordinates",
                "providerStatus": provider_status,
            })),
        )
            .into_response()),
        Err(_) => Err(ApiError::internal("Failed to reverse geocode coordinates")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_bounds() {
        assert!(ReverseGeocodeQuery {
            lat: 12.9716,
            lng: 77.5946
        }
        .validate()
        .is_ok());

        assert!(ReverseGeocodeQuery {
            lat: 90.1,
            lng: 0.0
        }
        .validate()
        .is_err());

        assert!(ReverseGeocodeQuery {
            lat: 0.0,
            lng: 180.5
        }
        .validate()
        .is_err());
    }
}
