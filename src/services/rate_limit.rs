// Fixed-window rate limiting backed by Redis
//
// Each (route, client) pair gets a counter key. The first increment in a
// window also sets the expiry, so the window starts at the first attempt
// and all attempts in it share one reset time.

use thiserror::Error;
use tracing::instrument;

use crate::db::RedisPool;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Per-route limiter settings
#[derive(Debug, Clone, Copy)]
pub struct RateLimitOptions {
    pub window_seconds: u64,
    pub max_attempts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u64,
    pub reset_in_seconds: u64,
}

pub struct RateLimitService {
    redis_pool: RedisPool,
}

impl RateLimitService {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(key: &str) -> String {
        format!("rate_limit:{}", key)
    }

    /// Count one attempt against the window and report whether it is allowed.
    /// The attempt is counted even when the answer is "no".
    #[instrument(skip(self), fields(key = %key))]
    pub async fn apply(
        &self,
        key: &str,
        options: RateLimitOptions,
    ) -> Result<RateLimitResult, RateLimitError> {
        let count = self
            .redis_pool
            .incr_fixed_window(&Self::key(key), options.window_seconds)
            .await?;

        Ok(Self::evaluate(count, options))
    }

    /// INCR returns a signed count; anything non-positive can only come from
    /// an external write to the key and counts as a fresh window.
    fn evaluate(count: i64, options: RateLimitOptions) -> RateLimitResult {
        let count = u64::try_from(count).unwrap_or(0);
        RateLimitResult {
            allowed: count <= options.max_attempts,
            remaining: options.max_attempts.saturating_sub(count),
            reset_in_seconds: options.window_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: RateLimitOptions = RateLimitOptions {
        window_seconds: 60,
        max_attempts: 3,
    };

    #[test]
    fn test_attempts_within_limit_are_allowed() {
        for count in 1..=3i64 {
            let result = RateLimitService::evaluate(count, OPTIONS);
            assert!(result.allowed, "attempt {} should be allowed", count);
            assert_eq!(result.remaining, (3 - count) as u64);
        }
    }

    #[test]
    fn test_attempts_past_limit_are_denied() {
        let result = RateLimitService::evaluate(4, OPTIONS);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.reset_in_seconds, 60);
    }

    #[test]
    fn test_remaining_never_underflows() {
        let result = RateLimitService::evaluate(1000, OPTIONS);
        assert_eq!(result.remaining, 0);
    }

    #[test]
    fn test_signed_store_counts_are_handled() {
        let result = RateLimitService::evaluate(i64::MAX, OPTIONS);
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);

        let result = RateLimitService::evaluate(-5, OPTIONS);
        assert!(result.allowed);
        assert_eq!(result.remaining, 3);
    }

    #[test]
    fn test_key_namespacing() {
        assert_eq!(
            RateLimitService::key("otp:+916000000001"),
            "rate_limit:otp:+916000000001"
        );
    }
}
