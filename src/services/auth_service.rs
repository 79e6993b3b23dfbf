use crate::db::credential_repository::CredentialRepository;
use crate::db::user_repository::UserRepository;
use crate::db::StoreError;
use crate::errors::AuthError;
use crate::models::user::{
    normalize_email, Credentials, LoginResult, LoginUser, NewUserRequest, User, UserProfile,
};
use crate::services::token_service::TokenService;
use crate::utils::auth::{hash_password, verify_password};
use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};

/// Signup, login and refresh on top of the stores and the token issuer.
pub struct AuthService {
    users: UserRepository,
    credentials: CredentialRepository,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(users: UserRepository, credentials: CredentialRepository, tokens: TokenService) -> Self {
        AuthService {
            users,
            credentials,
            tokens,
        }
    }

    pub async fn sign_up(&self, mut request: NewUserRequest) -> Result<User, AuthError> {
        request.email = normalize_email(&request.email);
        if let Err(message) = request.validate() {
            warn!(email = %request.email, reason = %message, "Signup rejected: invalid input");
            return Err(AuthError::Validation(message));
        }

        let password_hash = hash_password(&request.password).map_err(|e| {
            error!(error = ?e, "Failed to hash password");
            AuthError::Internal("failed to hash password".to_string())
        })?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            email: request.email,
            user_type: None,
            created_at: Utc::now(),
        };

        let user = match self.users.create_with_credential(user, &password_hash).await {
            Ok(u) => u,
            Err(StoreError::EmailTaken) => {
                warn!("Signup rejected: email already registered");
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    pub async fn login(&self, credentials: Credentials) -> Result<LoginResult, AuthError> {
        let user = self.verify_credentials(&credentials).await?;
        let profile = UserProfile::from(&user);

        let token = self.tokens.generate_access_token(&profile)?;
        let refresh = self.tokens.generate_refresh_token(&profile, &token).await?;

        // Re-read so the response reflects the stored profile.
        let user = self
            .users
            .get_by_id(&profile.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        info!(user_id = %user.id, "User logged in");

        Ok(LoginResult {
            token,
            refresh_token: refresh.refresh_token,
            expire_time: refresh.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            user: LoginUser {
                user_id: user.id,
                name: user.name,
                user_type: user.user_type.unwrap_or(0),
            },
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        match self.tokens.redeem_refresh_token(refresh_token).await {
            Ok(token) => Ok(token),
            Err(e) => {
                let err = AuthError::from(e);
                if matches!(err, AuthError::InvalidToken) {
                    warn!("Refresh rejected: unknown or expired refresh token");
                }
                Err(err)
            }
        }
    }

    pub async fn current_user(&self, profile: &UserProfile) -> Result<User, AuthError> {
        self.users
            .get_by_id(&profile.id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Every failure path yields the same error so callers cannot tell an unknown email
    /// from a wrong password.
    async fn verify_credentials(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let email = normalize_email(&credentials.email);
        let user = match self.users.get_by_email(&email).await? {
            Some(u) => u,
            None => {
                warn!(email = %email, "Login failed: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let credential = match self.credentials.find_by_user_id(&user.id).await? {
            Some(c) => c,
            None => {
                warn!(user_id = %user.id, "Login failed: user has no credential");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(&credentials.password, &credential.password_hash) {
            warn!(user_id = %user.id, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}
