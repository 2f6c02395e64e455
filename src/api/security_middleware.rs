//! Security Middleware
//!
//! Response security headers and fixed-window request throttling.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::utils::{error::AppError, security::SecurityHeaders};

/// Windows kept before stale ones are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Bucket used when the client address is unknown
const SHARED_BUCKET: &str = "shared";

/// Middleware to add security headers to all responses
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (key, value) in SecurityHeaders::standard() {
        headers.insert(key, value);
    }

    response
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Per-client fixed-window counter
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    max_requests: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.max_requests.max(1),
            window: config.window,
            clock,
        }
    }

    /// Counts one request for `client`; on refusal returns seconds until the window resets
    pub fn check(&self, client: &str) -> Result<(), u64> {
        let now = self.clock.now();

        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started_at) < self.window);
        }

        let mut entry = self.windows.entry(client.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started_at);
            let remaining = self.window.saturating_sub(elapsed);
            // Round up so clients never retry early
            let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(retry_after.max(1));
        }

        entry.count += 1;
        Ok(())
    }
}

/// Client identity: first `X-Forwarded-For` hop, else the peer address
fn client_key(headers: &HeaderMap, request: &Request) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| SHARED_BUCKET.to_string())
}

/// Rate limiting middleware applied to every route
pub async fn rate_limiting_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&headers, &request);

    match limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            log::warn!(
                "Rate limit exceeded for {} on {} {}",
                client,
                request.method(),
                request.uri().path()
            );

            let mut response =
                AppError::RateLimit("Too many requests. Please try again later.".into())
                    .into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use axum::http::StatusCode;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::util::ServiceExt;

    fn limiter(max_requests: u32, clock: Arc<ManualClock>) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::with_clock(
            &RateLimitConfig {
                max_requests,
                window: Duration::from_secs(60),
            },
            clock,
        ))
    }

    async fn test_handler() -> &'static str {
        "OK"
    }

    fn request_from(ip: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri("/test")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_window_allows_up_to_limit() {
        let clock = Arc::new(ManualClock::new());
        let limiter = limiter(3, clock.clone());

        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").is_ok());
        }
        assert_eq!(limiter.check("1.2.3.4"), Err(60));
        assert!(limiter.check("5.6.7.8").is_ok());

        clock.advance(Duration::from_secs(45));
        assert_eq!(limiter.check("1.2.3.4"), Err(15));

        clock.advance(Duration::from_secs(15));
        assert!(limiter.check("1.2.3.4").is_ok());
    }

    #[tokio::test]
    async fn test_middleware_returns_429_with_retry_after() {
        let clock = Arc::new(ManualClock::new());
        let app = Router::new()
            .route("/test", get(test_handler))
            .layer(from_fn_with_state(limiter(1, clock), rate_limiting_middleware));

        let first = app.clone().oneshot(request_from("9.9.9.9")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(request_from("9.9.9.9")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()["retry-after"], "60");

        let other = app.oneshot(request_from("8.8.8.8")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let app = Router::new()
            .route("/test", get(test_handler))
            .layer(axum::middleware::from_fn(security_headers_middleware));

        let response = app.oneshot(request_from("1.1.1.1")).await.unwrap();
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[test]
    fn test_client_key_fallbacks() {
        let request = request_from("10.0.0.1, 172.16.0.1");
        assert_eq!(client_key(request.headers(), &request), "10.0.0.1");

        let mut request = axum::http::Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&HeaderMap::new(), &request), SHARED_BUCKET);

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_key(&HeaderMap::new(), &request), "127.0.0.1");
    }
}
