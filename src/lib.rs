// Library exports for the NearBite API

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

pub use app::AppState;
pub use app_config::{config, AppConfig, CONFIG};
pub use db::{DieselPool, RedisConfig, RedisPool};
pub use middleware::{AuthSession, Role};
pub use services::{RateLimitResult, SessionPayload};
pub use utils::ApiError;

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", handlers::auth_routes(&state))
        .nest("/users", handlers::users_routes(&state))
        .nest("/restaurants", handlers::restaurants_routes(&state))
        .nest("/maps", handlers::maps_routes(&state))
        .nest("/admin", handlers::admin_routes(&state))
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "nearbite-api",
        "status": "ok",
        "environment": config().environment.to_string(),
    }))
}

/// GET /health
///
/// Exercises both backing stores: a pooled Postgres checkout and a Redis
/// SETEX probe. Reports per-component status with 503 when either is down.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let postgres_healthy = db::check_diesel_health(&state.diesel_pool).await.is_ok();

    let redis_probe = state
        .redis_pool
        .set_with_expiry("health:last_check", chrono::Utc::now().to_rfc3339(), 60)
        .await;
    let redis_health = state.redis_pool.health_check().await;
    let redis_healthy = redis_probe.is_ok() && redis_health.is_healthy;

    let healthy = postgres_healthy && redis_healthy;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "service": "nearbite-api",
            "components": {
                "postgres": {
                    "status": if postgres_healthy { "healthy" } else { "unhealthy" },
                },
                "redis": {
                    "status": if redis_healthy { "healthy" } else { "unhealthy" },
                    "latency_ms": redis_health.latency_ms,
                    "error": redis_health.error,
                },
            },
        })),
    )
}
