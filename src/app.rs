// Shared application state wired once at startup

use std::sync::Arc;
use std::time::Duration;

use crate::app_config::config;
use crate::db::{create_diesel_pool, DieselDatabaseConfig, DieselPool, RedisConfig, RedisPool};
use crate::services::{
    DocumentService, FirebaseAuthVerifier, GeocodeService, GoogleTokenMinter, RateLimitService,
    ServiceAccount, SessionService,
};

const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

/// State shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub diesel_pool: DieselPool,
    pub redis_pool: RedisPool,
    pub sessions: Arc<SessionService>,
    pub rate_limiter: Arc<RateLimitService>,
    pub firebase_auth: Arc<FirebaseAuthVerifier>,
    pub documents: Arc<DocumentService>,
    pub geocode: Arc<GeocodeService>,
}

impl AppState {
    /// Build the full state: pools first, then the services that ride on
    /// them. Fails fast when Postgres or Redis are unreachable or the
    /// service account JSON is unusable.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config = config();

        let diesel_pool = create_diesel_pool(DieselDatabaseConfig::default()).await?;
        let redis_pool = RedisPool::new(RedisConfig::from_app_config(config)).await?;

        let http = reqwest::Client::builder()
            .timeout(HTTP_CLIENT_TIMEOUT)
            .build()?;

        let account = ServiceAccount::parse(&config.firebase_service_account_json)?;
        let minter = Arc::new(GoogleTokenMinter::new(http.clone(), account));
        let firebase_auth = Arc::new(FirebaseAuthVerifier::new(
            http.clone(),
            config.firebase_project_id.clone(),
            Arc::clone(&minter),
        ));
        let documents = Arc::new(DocumentService::new(
            http.clone(),
            minter,
            config.firebase_storage_bucket_candidates(),
        ));
        let geocode = Arc::new(GeocodeService::new(
            http,
            redis_pool.clone(),
            config.google_maps_api_key.clone(),
        ));

        let sessions = Arc::new(SessionService::new(redis_pool.clone()));
        let rate_limiter = Arc::new(RateLimitService::new(redis_pool.clone()));

        Ok(Self {
            diesel_pool,
            redis_pool,
            sessions,
            rate_limiter,
            firebase_auth,
            documents,
            geocode,
        })
    }
}
