use actix_web::{
    Error, HttpMessage, HttpResponse, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
};

use crate::jwt::JwtService;
use crate::types::AuthContext;

/// Middleware for handling authentication by verifying JWT tokens
/// and attaching the caller's identity to the request.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: JwtService::new(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: JwtService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let jwt_service = self.jwt_service.clone();

        Box::pin(async move {
            // Extract Authorization header
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            let token = match auth_header {
                Some(token) => token,
                None => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "missing_token",
                        "message": "Authorization token is required"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            // Verify token and extract the caller identity
            let context = match jwt_service.extract_auth_context(token) {
                Ok(context) => context,
                Err(_) => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "invalid_token",
                        "message": "Invalid or expired token"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            // Add the identity to request extensions
            req.extensions_mut().insert(context);

            // Continue with the request
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Custom extractor for the authenticated user ID
pub struct AuthenticatedUser(pub uuid::Uuid);

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let context = req.extensions().get::<AuthContext>().cloned();

        ready(match context {
            Some(context) => Ok(AuthenticatedUser(context.user_id)),
            None => Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            )),
        })
    }
}

/// Custom extractor that additionally requires the admin role
pub struct AdminUser(pub uuid::Uuid);

impl actix_web::FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let context = req.extensions().get::<AuthContext>().cloned();

        ready(match context {
            Some(context) if context.role == "admin" => Ok(AdminUser(context.user_id)),
            Some(_) => Err(actix_web::error::ErrorForbidden("Admin role required")),
            None => Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            )),
        })
    }
}
