use crate::config::Config;
use crate::db::Database;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize, ToSchema)]
pub struct HealthChecks {
    pub jwt_uses_default: bool,
    pub storage_reachable: bool,
}

/// Public health check endpoint with dependency checks
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(config: web::Data<Config>, database: web::Data<Database>) -> impl Responder {
    let jwt_uses_default = config.uses_default_secret();
    let storage_reachable = database.is_reachable();

    if jwt_uses_default {
        warn!("Health check: Using default JWT secret - NOT SECURE FOR PRODUCTION");
    }
    if !storage_reachable {
        warn!("Health check: storage not reachable");
    }

    let healthy = !jwt_uses_default && storage_reachable;
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            jwt_uses_default,
            storage_reachable,
        },
    };

    if healthy {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
