//! Health and maintenance handlers.

use crate::{
    types::{MigrationReport, ModelKind},
    AppState,
};
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Providers queries may be sent to
    pub providers: Vec<ModelKind>,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.providers.configured(),
    })
}

/// Backfill legacy records. Failures are reported in the body, not the status.
#[utoipa::path(
    post,
    path = "/api/migrations/run",
    responses(
        (status = 200, description = "Migration report", body = MigrationReport)
    ),
    tag = "system"
)]
pub async fn run_migrations(State(state): State<AppState>) -> Json<MigrationReport> {
    match state.store.run_migrations().await {
        Ok(report) => Json(report),
        Err(e) => {
            tracing::error!(error = %e, "Migration failed");
            Json(MigrationReport {
                success: false,
                message: e.to_string(),
            })
        }
    }
}
