// Reverse geocoding through the Google Geocoding API with a Redis cache
//
// Coordinates are rounded to six decimal places before lookup so nearby
// requests share a cache entry. Cached addresses live for 24 hours.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::RedisPool;

const GEOCODE_API_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const CACHE_TTL_SECONDS: u64 = 60 * 60 * 24;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding provider error")]
    Provider,

    #[error("Address not found for these coordinates")]
    NotFound { provider_status: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddressSource {
    Cache,
    Provider,
}

impl AddressSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSource::Cache => "cache",
            AddressSource::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReverseGeocodeResult {
    pub address: String,
    pub source: AddressSource,
}

#[derive(Debug, Deserialize)]
struct GeocodeApiResponse {
    #[serde(default)]
    results: Vec<GeocodeApiResult>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeApiResult {
    formatted_address: Option<String>,
}

pub struct GeocodeService {
    http: reqwest::Client,
    redis_pool: RedisPool,
    api_key: String,
}

impl GeocodeService {
    pub fn new(http: reqwest::Client, redis_pool: RedisPool, api_key: String) -> Self {
        Self {
            http,
            redis_pool,
            api_key,
        }
    }

    #[instrument(skip(self))]
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<ReverseGeocodeResult, GeocodeError> {
        let lat = round_coordinate(lat);
        let lng = round_coordinate(lng);
        let cache_key = cache_key(lat, lng);

        if let Some(address) = self.redis_pool.get(&cache_key).await? {
            debug!(key = %cache_key, "reverse geocode cache hit");
            return Ok(ReverseGeocodeResult {
                address,
                source: AddressSource::Cache,
            });
        }

        let response = self
            .http
            .get(GEOCODE_API_URL)
            .query(&[
                ("latlng", format!("{},{}", lat, lng)),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::Provider);
        }

        let payload: GeocodeApiResponse = response.json().await?;
        let address = payload
            .results
            .into_iter()
            .next()
            .and_then(|r| r.formatted_address);

        let Some(address) = address else {
            return Err(GeocodeError::NotFound {
                provider_status: payload.status.unwrap_or_else(|| "UNKNOWN".to_string()),
            });
        };

        self.redis_pool
            .set_with_expiry(&cache_key, address.clone(), CACHE_TTL_SECONDS)
            .await?;

        Ok(ReverseGeocodeResult {
            address,
            source: AddressSource::Provider,
        })
    }
}

fn round_coordinate(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn cache_key(lat: f64, lng: f64) -> String {
    format!("maps:reverse_geocode:{}:{}", lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_coordinate_to_six_decimals() {
        assert_eq!(round_coordinate(12.971600449), 12.9716);
        assert_eq!(round_coordinate(77.5946), 77.5946);
        assert_eq!(round_coordinate(-0.0000004), -0.0);
    }

    #[test]
    fn test_cache_key_drops_trailing_zeros() {
        let key = cache_key(round_coordinate(12.971600), round_coordinate(77.594600));
        assert_eq!(key, "maps:reverse_geocode:12.9716:77.5946");
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(AddressSource::Cache.as_str(), "cache");
        assert_eq!(AddressSource::Provider.as_str(), "provider");
    }
}
