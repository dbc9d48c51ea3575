//! URL-keyed response cache for the public catalog endpoints.
//!
//! Successful GET responses are kept in an in-memory TTL map keyed by path and
//! query string. Entries expire on read; there is no write-through
//! invalidation, so the TTL is kept short.

use std::{
    collections::HashMap,
    future::{Ready, ready},
    rc::Rc,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use actix_web::{
    Error, HttpResponse, Result,
    body::{EitherBody, MessageBody, to_bytes},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, StatusCode, header},
};
use futures_util::future::LocalBoxFuture;

/// Upper bound on cached entries before new responses stop being cached
const MAX_ENTRIES: usize = 1024;

#[derive(Clone)]
struct CachedResponse {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
    expires_at: Instant,
}

/// Shared in-memory store behind the cache middleware
#[derive(Clone)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<String, CachedResponse>>>,
}

impl ResponseCache {
    /// Creates a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Reads the TTL from `CATALOG_CACHE_TTL_SECS`, defaulting to 30 seconds
    pub fn from_env() -> Self {
        let ttl_secs = std::env::var("CATALOG_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Self::new(Duration::from_secs(ttl_secs))
    }

    fn get(&self, key: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: String, status: StatusCode, content_type: String, body: Vec<u8>) {
        let mut entries = self.entries.lock().unwrap();

        if entries.len() >= MAX_ENTRIES {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= MAX_ENTRIES {
                return;
            }
        }

        entries.insert(
            key,
            CachedResponse {
                status,
                content_type,
                body,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

/// Middleware that serves GET responses from the cache when possible
pub struct CacheMiddleware {
    cache: ResponseCache,
}

impl CacheMiddleware {
    /// Creates the middleware around a shared store
    pub fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CacheMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CacheMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CacheMiddlewareService {
            service: Rc::new(service),
            cache: self.cache.clone(),
        }))
    }
}

/// Service that implements the cache middleware logic
pub struct CacheMiddlewareService<S> {
    service: Rc<S>,
    cache: ResponseCache,
}

impl<S, B> Service<ServiceRequest> for CacheMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let cache = self.cache.clone();

        Box::pin(async move {
            // Only GETs are cacheable
            if req.method() != Method::GET {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let key = match req.query_string() {
                "" => req.path().to_string(),
                query => format!("{}?{}", req.path(), query),
            };

            if let Some(entry) = cache.get(&key) {
                let mut builder = HttpResponse::build(entry.status);
                builder.insert_header((header::CONTENT_TYPE, entry.content_type.clone()));
                let response = builder.body(entry.body.clone());
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            let status = res.status();

            // Don't cache errors
            if !status.is_success() {
                return Ok(res.map_into_left_body());
            }

            let content_type = res
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/json")
                .to_string();

            let (req, res) = res.into_parts();
            let body = to_bytes(res.into_body()).await.map_err(|e| {
                let e: Box<dyn std::error::Error> = e.into();
                actix_web::error::ErrorInternalServerError(e.to_string())
            })?;

            cache.insert(key, status, content_type.clone(), body.to_vec());

            let mut builder = HttpResponse::build(status);
            builder.insert_header((header::CONTENT_TYPE, content_type));
            let response = builder.body(body);

            Ok(ServiceResponse::new(req, response).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_for(cache: &ResponseCache, key: &str) -> Option<Vec<u8>> {
        cache.get(key).map(|e| e.body)
    }

    #[test]
    fn entries_are_served_until_the_ttl_passes() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(
            "/api/catalog/resources".to_string(),
            StatusCode::OK,
            "application/json".to_string(),
            b"{}".to_vec(),
        );

        assert_eq!(
            entry_for(&cache, "/api/catalog/resources"),
            Some(b"{}".to_vec())
        );
        assert_eq!(entry_for(&cache, "/api/catalog/resources?page=2"), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.insert(
            "/api/catalog/resources".to_string(),
            StatusCode::OK,
            "application/json".to_string(),
            b"{}".to_vec(),
        );

        assert_eq!(entry_for(&cache, "/api/catalog/resources"), None);
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn a_full_cache_stops_accepting_new_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        for i in 0..MAX_ENTRIES {
            cache.insert(
                format!("/api/catalog/resources?page={}", i),
                StatusCode::OK,
                "application/json".to_string(),
                b"{}".to_vec(),
            );
        }

        cache.insert(
            "/api/catalog/resources?page=overflow".to_string(),
            StatusCode::OK,
            "application/json".to_string(),
            b"{}".to_vec(),
        );

        assert_eq!(entry_for(&cache, "/api/catalog/resources?page=overflow"), None);
    }
}
