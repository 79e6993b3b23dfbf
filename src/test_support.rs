//! Shared fixtures for unit tests.

use crate::config::Config;
use crate::db::credential_repository::CredentialRepository;
use crate::db::refresh_token_repository::RefreshTokenRepository;
use crate::db::user_repository::UserRepository;
use crate::db::Database;
use crate::services::auth_service::AuthService;
use crate::services::token_service::TokenService;
use chrono::Duration;

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        db_path: String::new(),
        jwt_secret: "test-secret-key".to_string(),
        access_token_ttl: Duration::seconds(259_200),
        refresh_token_ttl: Duration::seconds(604_800),
    }
}

pub fn token_service(db: &Database) -> TokenService {
    TokenService::new(&test_config(), RefreshTokenRepository::new(db.clone()))
}

pub fn auth_service(db: &Database) -> AuthService {
    AuthService::new(
        UserRepository::new(db.clone()),
        CredentialRepository::new(db.clone()),
        token_service(db),
    )
}
