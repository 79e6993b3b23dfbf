use crate::db::StoreError;
use crate::services::token_service::TokenError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the auth flow. Every variant maps to a JSON `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    /// Wrong email, wrong password or no credential. Deliberately one message.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired | TokenError::Malformed => {
                AuthError::InvalidToken
            }
            TokenError::Signing(e) => AuthError::Internal(format!("token signing failed: {}", e)),
            TokenError::Storage(e) => AuthError::Storage(e),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AuthError::Storage(e) => {
                error!(error = %e, "Storage error while handling request");
                "Server error".to_string()
            }
            AuthError::Internal(e) => {
                error!(error = %e, "Internal error while handling request");
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
