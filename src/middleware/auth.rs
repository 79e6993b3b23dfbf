use crate::errors::AuthError;
use crate::services::token_service::TokenService;
use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use tracing::{debug, error};

/// Requires `Authorization: Bearer <access token>` and stores the verified
/// [`UserProfile`](crate::models::user::UserProfile) in the request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

fn reject<B>(req: ServiceRequest, err: AuthError) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B, BoxBody>>, Error>>
where
    B: 'static,
{
    let (req, _pl) = req.into_parts();
    let res = err.error_response();
    Box::pin(async move { Ok(ServiceResponse::new(req, res).map_into_right_body()) })
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|value| value.trim().to_string());

        let Some(token) = token else {
            debug!(path = %req.path(), "Request without bearer token");
            return reject(req, AuthError::InvalidToken);
        };

        let Some(tokens) = req.app_data::<web::Data<TokenService>>().cloned() else {
            error!("TokenService missing from app data");
            return reject(req, AuthError::Internal("token service not configured".to_string()));
        };

        let profile = match tokens.verify_access_token(&token) {
            Ok(profile) => profile,
            Err(e) => {
                debug!(error = %e, path = %req.path(), "Access token rejected");
                return reject(req, AuthError::InvalidToken);
            }
        };

        req.extensions_mut().insert(profile);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
