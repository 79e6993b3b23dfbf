use crate::config::Config;
use crate::db::refresh_token_repository::RefreshTokenRepository;
use crate::db::StoreError;
use crate::models::token::{Claims, IssuedRefreshToken, RefreshTokenRecord};
use crate::models::user::UserProfile;
use crate::utils::auth::{decode_jwt, encode_jwt, generate_opaque_token, JwtKeys};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("token expired")]
    Expired,

    #[error("malformed token")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

/// Issues and checks access tokens, and owns the refresh token lifecycle.
///
/// Signing keys and TTLs are fixed at construction. Clones share state.
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<TokenServiceInner>,
}

struct TokenServiceInner {
    keys: JwtKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    refresh_tokens: RefreshTokenRepository,
}

impl TokenService {
    pub fn new(config: &Config, refresh_tokens: RefreshTokenRepository) -> Self {
        TokenService {
            inner: Arc::new(TokenServiceInner {
                keys: JwtKeys::from_secret(&config.jwt_secret),
                access_ttl: config.access_token_ttl,
                refresh_ttl: config.refresh_token_ttl,
                refresh_tokens,
            }),
        }
    }

    pub fn generate_access_token(&self, profile: &UserProfile) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: profile.id.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.inner.access_ttl).timestamp() as usize,
        };

        encode_jwt(&claims, &self.inner.keys).map_err(TokenError::Signing)
    }

    /// Persist a refresh token bound to the subject of `access_token`, which must be a
    /// valid token issued for `profile`.
    pub async fn generate_refresh_token(
        &self,
        profile: &UserProfile,
        access_token: &str,
    ) -> Result<IssuedRefreshToken, TokenError> {
        let claims = decode_jwt(access_token, &self.inner.keys)?;
        if claims.sub != profile.id {
            return Err(TokenError::Invalid);
        }

        let now = Utc::now();
        let record = RefreshTokenRecord {
            user_id: claims.sub,
            access_token_id: claims.jti,
            created_at: now,
            expires_at: now + self.inner.refresh_ttl,
        };
        let refresh_token = generate_opaque_token();

        let purged = self.inner.refresh_tokens.purge_expired(now).await?;
        if purged > 0 {
            debug!(count = purged, "Expired refresh tokens purged");
        }

        self.inner
            .refresh_tokens
            .insert(&refresh_token, &record)
            .await?;

        info!(user_id = %record.user_id, expires_at = %record.expires_at, "Refresh token issued");

        Ok(IssuedRefreshToken {
            refresh_token,
            expires_at: record.expires_at,
        })
    }

    /// Mint a new access token for the refresh token's subject. The refresh token stays
    /// valid until its own expiry.
    pub async fn redeem_refresh_token(&self, token: &str) -> Result<String, TokenError> {
        let record = self
            .inner
            .refresh_tokens
            .get(token)
            .await?
            .ok_or(TokenError::Invalid)?;

        if record.is_expired_at(Utc::now()) {
            self.inner.refresh_tokens.remove(token).await?;
            debug!(user_id = %record.user_id, "Expired refresh token removed");
            return Err(TokenError::Expired);
        }

        let profile = UserProfile {
            id: record.user_id,
        };
        self.generate_access_token(&profile)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<UserProfile, TokenError> {
        let claims = decode_jwt(token, &self.inner.keys)?;
        Ok(UserProfile { id: claims.sub })
    }
}
