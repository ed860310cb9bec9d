//! Query submission.

use crate::{
    db::NewMessage,
    types::{AppError, ConversationStatus, Result, SubmitQueryRequest, SubmitQueryResponse},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Longest conversation title derived from a query
const TITLE_MAX_CHARS: usize = 100;

/// Submit a company name or URL for research.
///
/// Creates the conversation when none is given, stores the user message and
/// schedules one background research job for it.
#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SubmitQueryRequest,
    responses(
        (status = 202, description = "Research job scheduled", body = SubmitQueryResponse),
        (status = 400, description = "Empty query or unconfigured provider"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn submit_query(
    State(state): State<AppState>,
    Json(payload): Json<SubmitQueryRequest>,
) -> Result<(StatusCode, Json<SubmitQueryResponse>)> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("content must not be empty".to_string()));
    }
    if !state.providers.is_configured(payload.model) {
        return Err(AppError::InvalidInput(format!(
            "Provider '{}' is not configured",
            payload.model
        )));
    }

    let conversation_id = match payload.conversation_id {
        Some(id) => {
            state
                .store
                .get_conversation(&id)
                .await?
                .ok_or_else(|| AppError::NotFound("Conversation".to_string()))?
                .id
        }
        None => {
            let title: String = content.chars().take(TITLE_MAX_CHARS).collect();
            state
                .store
                .create_conversation(&title, ConversationStatus::Active)
                .await?
                .id
        }
    };

    let message = state
        .store
        .add_message(NewMessage::user(&conversation_id, content, payload.model))
        .await?;

    state.scheduler.schedule(&message.id, payload.model);
    tracing::info!(
        conversation_id = %conversation_id,
        message_id = %message.id,
        model = %payload.model,
        "Research query accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitQueryResponse {
            conversation_id,
            message_id: message.id,
        }),
    ))
}
