//! Research history handlers.

use crate::{
    types::{ResearchResult, ResearchSummary, Result, UpdateNotesRequest},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Rows shown in the history table
const SUMMARY_LIMIT: usize = 10;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_open: bool,
}

/// All research results, newest first.
#[utoipa::path(
    get,
    path = "/api/research-results",
    responses(
        (status = 200, description = "Research results", body = Vec<ResearchResult>)
    ),
    tag = "research-results"
)]
pub async fn list_results(State(state): State<AppState>) -> Result<Json<Vec<ResearchResult>>> {
    Ok(Json(state.store.list_research_results().await?))
}

/// The ten most recent results in summary form.
#[utoipa::path(
    get,
    path = "/api/research-results/summaries",
    responses(
        (status = 200, description = "Recent research summaries", body = Vec<ResearchSummary>)
    ),
    tag = "research-results"
)]
pub async fn list_summaries(State(state): State<AppState>) -> Result<Json<Vec<ResearchSummary>>> {
    Ok(Json(state.store.research_summaries(SUMMARY_LIMIT).await?))
}

/// Flip the expanded state of a result.
#[utoipa::path(
    post,
    path = "/api/research-results/{id}/toggle",
    params(
        ("id" = String, Path, description = "Research result ID")
    ),
    responses(
        (status = 200, description = "New state", body = ToggleResponse),
        (status = 404, description = "Research result not found")
    ),
    tag = "research-results"
)]
pub async fn toggle_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>> {
    let is_open = state.store.toggle_research_result(&id).await?;
    Ok(Json(ToggleResponse { is_open }))
}

/// Replace the notes of a result.
#[utoipa::path(
    put,
    path = "/api/research-results/{id}/notes",
    params(
        ("id" = String, Path, description = "Research result ID")
    ),
    request_body = UpdateNotesRequest,
    responses(
        (status = 204, description = "Notes saved"),
        (status = 404, description = "Research result not found")
    ),
    tag = "research-results"
)]
pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<StatusCode> {
    state.store.update_research_notes(&id, &payload.notes).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a result.
#[utoipa::path(
    delete,
    path = "/api/research-results/{id}",
    params(
        ("id" = String, Path, description = "Research result ID")
    ),
    responses(
        (status = 204, description = "Research result deleted"),
        (status = 404, description = "Research result not found")
    ),
    tag = "research-results"
)]
pub async fn delete_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_research_result(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
