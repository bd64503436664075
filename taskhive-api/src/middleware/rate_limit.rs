/// Rate limiting middleware
///
/// Token bucket per client, kept in process memory. The bucket holds
/// `RATE_LIMIT_MAX_REQUESTS` tokens refilled linearly over
/// `RATE_LIMIT_WINDOW_SECS` (defaults: 100 requests per 15 minutes). Clients
/// are keyed by `X-Forwarded-For` when present (the API runs behind a proxy
/// in production), falling back to the socket peer address.
///
/// # Headers
///
/// Every response carries:
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: tokens left
/// - `Retry-After`: seconds to wait (429 responses only)

use crate::{app::AppState, config::RateLimitConfig, error::ApiError};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;

/// Upper bound on tracked clients before idle buckets are evicted
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Token bucket state for one client
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,

    /// Last refill instant
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a new full bucket
    fn new(capacity: u32) -> Self {
        TokenBucket {
            tokens: f64::from(capacity),
            last_refill: Instant::now(),
        }
    }

    /// Refills tokens based on elapsed time, capped at capacity
    fn refill(&mut self, rate: f64, capacity: u32) {
        let elapsed = self.last_refill.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(f64::from(capacity));
        self.last_refill = Instant::now();
    }

    /// Attempts to consume one token
    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Seconds until one token is available
    fn seconds_until_available(&self, rate: f64) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub ok: bool,

    /// Tokens remaining after this request
    pub remaining: u32,

    /// Seconds until the next token (429 responses)
    pub retry_after: u64,
}

/// Shared per-client token bucket store
#[derive(Debug)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    capacity: u32,
    refill_rate: f64,
}

impl RateLimiter {
    /// Creates a limiter from the configured window and request cap
    pub fn new(config: RateLimitConfig) -> Self {
        let window = config.window_secs.max(1);
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity: config.max_requests,
            refill_rate: f64::from(config.max_requests) / window as f64,
        }
    }

    /// Requests allowed per window
    pub fn limit(&self) -> u32 {
        self.capacity
    }

    /// Checks and consumes one request for a client
    pub fn check(&self, client: &str) -> RateLimitDecision {
        let mut buckets = self.buckets.lock().expect("rate limiter lock poisoned");

        // Bound memory: drop buckets that have fully refilled
        if buckets.len() >= MAX_TRACKED_CLIENTS {
            let rate = self.refill_rate;
            let capacity = self.capacity;
            buckets.retain(|_, bucket| {
                bucket.refill(rate, capacity);
                bucket.tokens < f64::from(capacity)
            });
        }

        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));

        bucket.refill(self.refill_rate, self.capacity);

        if bucket.try_consume() {
            RateLimitDecision {
                ok: true,
                remaining: bucket.tokens as u32,
                retry_after: 0,
            }
        } else {
            RateLimitDecision {
                ok: false,
                remaining: 0,
                retry_after: bucket.seconds_until_available(self.refill_rate).max(1),
            }
        }
    }
}

/// Resolves the client key for a request
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        // First hop is the original client
        if let Some(client) = forwarded.split(',').next() {
            return client.trim().to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware layer
///
/// Returns 429 with `Retry-After` once a client's bucket is empty.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    let decision = state.rate_limiter.check(&client);

    let mut response = if decision.ok {
        next.run(req).await
    } else {
        tracing::warn!(client = %client, retry_after = decision.retry_after, "Rate limit exceeded");
        ApiError::RateLimitExceeded {
            retry_after: decision.retry_after,
            message: "Too many requests, please try again later.".to_string(),
        }
        .into_response()
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&state.rate_limiter.limit().to_string()) {
        headers.insert("X-RateLimit-Limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_secs,
            max_requests,
        })
    }

    #[test]
    fn test_bucket_consume() {
        let mut bucket = TokenBucket::new(10);
        assert!(bucket.try_consume());
        assert!((bucket.tokens - 9.0).abs() < 1e-9);

        bucket.tokens = 0.5;
        assert!(!bucket.try_consume());
        assert!((bucket.tokens - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_refill_capped() {
        let mut bucket = TokenBucket {
            tokens: 95.0,
            last_refill: Instant::now() - Duration::from_secs(10),
        };

        // 1 token/sec for 10 seconds, capped at capacity
        bucket.refill(1.0, 100);
        assert!((bucket.tokens - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_bucket_refill_partial() {
        let mut bucket = TokenBucket {
            tokens: 5.0,
            last_refill: Instant::now() - Duration::from_secs(10),
        };

        bucket.refill(1.0, 100);
        assert!(bucket.tokens >= 15.0 && bucket.tokens < 16.0);
    }

    #[test]
    fn test_bucket_seconds_until_available() {
        let bucket = TokenBucket {
            tokens: 0.0,
            last_refill: Instant::now(),
        };

        // 1 token deficit at 0.5 tokens/sec -> 2 seconds
        assert_eq!(bucket.seconds_until_available(0.5), 2);

        let full = TokenBucket::new(1);
        assert_eq!(full.seconds_until_available(0.5), 0);
    }

    #[test]
    fn test_limiter_exhausts_and_rejects() {
        let limiter = limiter(3, 900);

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").ok);
        }

        let decision = limiter.check("10.0.0.1");
        assert!(!decision.ok);
        assert!(decision.retry_after >= 1);
    }

    #[test]
    fn test_limiter_isolates_clients() {
        let limiter = limiter(1, 900);

        assert!(limiter.check("10.0.0.1").ok);
        assert!(!limiter.check("10.0.0.1").ok);
        assert!(limiter.check("10.0.0.2").ok);
    }
}
