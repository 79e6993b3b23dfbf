use crate::errors::AuthError;
use crate::models::token::{RefreshGrant, RefreshResult};
use crate::models::user::{Credentials, NewUserRequest, UserProfile};
use crate::services::auth_service::AuthService;
use actix_web::{web, HttpResponse};
use tracing::info;

/// Create a user account
#[utoipa::path(
    post,
    path = "/users/signup",
    request_body = NewUserRequest,
    responses(
        (status = 200, description = "User created", body = crate::models::user::User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Authentication"
)]
pub async fn signup(
    auth: web::Data<AuthService>,
    payload: web::Json<NewUserRequest>,
) -> Result<HttpResponse, AuthError> {
    info!(email = %payload.email, "Signup attempt");

    let user = auth.sign_up(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Exchange email and password for an access/refresh token pair
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = crate::models::user::LoginResult),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    auth: web::Data<AuthService>,
    payload: web::Json<Credentials>,
) -> Result<HttpResponse, AuthError> {
    info!(email = %payload.email, "Login attempt");

    let result = auth.login(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Reissue an access token from a refresh token
#[utoipa::path(
    post,
    path = "/users/refresh-token",
    request_body = RefreshGrant,
    responses(
        (status = 200, description = "New access token", body = crate::models::token::RefreshResult),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Authentication"
)]
pub async fn refresh_token(
    auth: web::Data<AuthService>,
    payload: web::Json<RefreshGrant>,
) -> Result<HttpResponse, AuthError> {
    let token = auth.refresh(&payload.refresh_token).await?;
    Ok(HttpResponse::Ok().json(RefreshResult { token }))
}

/// Profile of the caller identified by the bearer token
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = crate::models::user::User),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
pub async fn me(
    auth: web::Data<AuthService>,
    profile: web::ReqData<UserProfile>,
) -> Result<HttpResponse, AuthError> {
    let user = auth.current_user(&profile).await?;
    Ok(HttpResponse::Ok().json(user))
}
