use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Canonical form used for storage and lookup: surrounding whitespace removed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A user as stored and as returned to clients. Carries no password material.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Reduced view of a user that travels as the token subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct NewUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[schema(min_length = 8)]
    pub password: String,
}

impl NewUserRequest {
    /// Field constraints checked before any store access.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Name must not be empty".to_string());
            }
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("Invalid email format".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub user_type: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    pub refresh_token: String,
    /// Refresh token expiry, RFC 3339.
    pub expire_time: String,
    pub user: LoginUser,
}
