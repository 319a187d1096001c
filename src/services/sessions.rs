// Session store over Redis
//
// A session is an opaque random token mapped to {userId, role} with a fixed
// TTL. There is no rotation or refresh; logout deletes the key and idle
// sessions expire on their own.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::db::RedisPool;
use crate::middleware::auth::Role;

/// Sessions live for 7 days
pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 7;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What a session token resolves to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPayload {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
}

/// Newly created session handed back to the login handlers
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session_id: String,
    pub ttl_seconds: u64,
}

pub struct SessionService {
    redis_pool: RedisPool,
}

impl SessionService {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Create a session for the given identity. Token uniqueness rests on
    /// the randomness of v4 UUIDs; there is no collision check.
    #[instrument(skip(self, payload), fields(role = %payload.role))]
    pub async fn create(&self, payload: &SessionPayload) -> Result<CreatedSession, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let value = serde_json::to_string(payload)?;

        self.redis_pool
            .set_with_expiry(&Self::key(&session_id), value, SESSION_TTL_SECONDS)
            .await?;

        Ok(CreatedSession {
            session_id,
            ttl_seconds: SESSION_TTL_SECONDS,
        })
    }

    /// Resolve a session token; `None` on miss, expiry, or an undecodable
    /// value left behind by an older deployment.
    #[instrument(skip(self, session_id))]
    pub async fn get(&self, session_id: &str) -> Result<Option<SessionPayload>, SessionError> {
        let value = self.redis_pool.get(&Self::key(session_id)).await?;

        Ok(value.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    /// Delete a session; no-op when the token is unknown
    #[instrument(skip(self, session_id))]
    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.redis_pool.del(&Self::key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_shape() {
        let payload = SessionPayload {
            user_id: "admin".to_string(),
            role: Role::Admin,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"userId":"admin","role":"admin"}"#);

        let decoded: SessionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_payload_rejects_unknown_role() {
        let result: Result<SessionPayload, _> =
            serde_json::from_str(r#"{"userId":"x","role":"superuser"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_key_namespacing() {
        assert_eq!(
            SessionService::key("abc-123"),
            "session:abc-123".to_string()
        );
    }
}
