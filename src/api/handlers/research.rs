//! Streaming research endpoint.

use crate::{
    types::{Result, StreamResearchRequest},
    AppState,
};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::convert::Infallible;

/// Stream a research reply as raw text deltas.
///
/// The reply keeps being persisted after the client disconnects.
#[utoipa::path(
    post,
    path = "/api/research/stream",
    request_body = StreamResearchRequest,
    responses(
        (status = 200, description = "Text deltas", content_type = "text/event-stream", body = String),
        (status = 404, description = "Message not found")
    ),
    tag = "research"
)]
pub async fn stream_research(
    State(state): State<AppState>,
    Json(payload): Json<StreamResearchRequest>,
) -> Result<Response> {
    let message = state.gateway.open(&payload.message_id).await?;
    let mut deltas = state.gateway.start(message, payload.content);

    let body = async_stream::stream! {
        while let Some(delta) = deltas.recv().await {
            yield Ok::<_, Infallible>(delta);
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
