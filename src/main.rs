mod config;
mod db;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use config::Config;
use db::credential_repository::CredentialRepository;
use db::refresh_token_repository::RefreshTokenRepository;
use db::user_repository::UserRepository;
use db::Database;
use dotenv::dotenv;
use services::auth_service::AuthService;
use services::token_service::TokenService;
use std::io;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api::health,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::me,
    ),
    components(
        schemas(
            handlers::api::HealthResponse,
            handlers::api::HealthChecks,
            models::user::User,
            models::user::NewUserRequest,
            models::user::Credentials,
            models::user::LoginResult,
            models::user::LoginUser,
            models::token::RefreshGrant,
            models::token::RefreshResult,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Signup, login and token refresh")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /users/login"))
                        .build(),
                ),
            );
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json()
        .init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    if config.uses_default_secret() {
        warn!("JWT_SECRET not set, using the development default");
    }

    let database = Database::new(&config.db_path).map_err(io::Error::other)?;
    info!(db_path = %config.db_path, "Database initialized");

    let tokens = TokenService::new(&config, RefreshTokenRepository::new(database.clone()));
    let auth = web::Data::new(AuthService::new(
        UserRepository::new(database.clone()),
        CredentialRepository::new(database.clone()),
        tokens.clone(),
    ));
    let tokens = web::Data::new(tokens);
    let shared_config = web::Data::new(config.clone());
    let shared_database = web::Data::new(database);

    let bind_address = config.bind_address();

    info!(
        bind_address = %bind_address,
        access_ttl_secs = config.access_token_ttl.num_seconds(),
        refresh_ttl_secs = config.refresh_token_ttl.num_seconds(),
        "Starting auth server"
    );
    info!("Available endpoints:");
    info!("   GET  /health               - Health check (public)");
    info!("   POST /users/signup         - Create account (public)");
    info!("   POST /users/login          - Login (public)");
    info!("   POST /users/refresh-token  - Reissue access token (public)");
    info!("   GET  /users/me             - Current user (bearer token)");
    info!(
        explorer_url = format!("http://{}/explorer/", bind_address),
        "API explorer available"
    );

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(auth.clone())
            .app_data(tokens.clone())
            .app_data(shared_config.clone())
            .app_data(shared_database.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
            .service(SwaggerUi::new("/explorer/{_:.*}").url("/openapi.json", ApiDoc::openapi()))
            .configure(handlers::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
