//! Fixed-window, per-client rate limiting for the API scope.
//!
//! Requests are counted per client IP in an in-memory map; when a client
//! exceeds the window budget the middleware answers 429 without touching
//! the handlers.

use std::{
    collections::HashMap,
    future::{Ready, ready},
    rc::Rc,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use actix_web::{
    Error, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;

/// Configuration for rate limiting
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Requests each client may make per window
    pub requests_per_window: usize,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 120,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let requests_per_window = std::env::var("RATE_LIMIT_REQUESTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        let window_secs = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            requests_per_window,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Simple in-memory rate limiter
#[derive(Clone)]
pub struct SimpleRateLimiter {
    config: RateLimitConfig,
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl SimpleRateLimiter {
    /// Creates a limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records a request for `key` and returns whether it is within budget
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();

        let timestamps = requests.entry(key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.config.window);

        if timestamps.len() >= self.config.requests_per_window {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Middleware that applies the limiter to every request in its scope
pub struct RateLimitMiddleware {
    limiter: SimpleRateLimiter,
}

impl RateLimitMiddleware {
    /// Creates the middleware around a shared limiter
    pub fn new(limiter: SimpleRateLimiter) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

/// Service that implements the rate limiting middleware logic
pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: SimpleRateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            let client_key = client_key(&req);

            if !limiter.check_rate_limit(&client_key) {
                let response = HttpResponse::TooManyRequests().json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "Too many requests, slow down"
                }));
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Picks the client identity: the first forwarded address when present,
/// otherwise the peer address.
fn client_key(req: &ServiceRequest) -> String {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests: usize) -> SimpleRateLimiter {
        SimpleRateLimiter::new(RateLimitConfig {
            requests_per_window: requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn requests_within_budget_pass() {
        let limiter = limiter(3);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn the_request_over_budget_is_blocked() {
        let limiter = limiter(2);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(!limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn clients_are_limited_independently() {
        let limiter = limiter(1);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.2"));
        assert!(!limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn old_requests_fall_out_of_the_window() {
        let limiter = SimpleRateLimiter::new(RateLimitConfig {
            requests_per_window: 1,
            window: Duration::ZERO,
        });

        // With a zero-length window every request starts a fresh budget
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }
}
