use crate::api::handlers::{conversations, messages, research, research_results, system};
use crate::api::ApiDoc;
use crate::AppState;
use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// Queries and notes are short; anything larger is rejected with 413
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Routes below `/api`, without state
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route(
            "/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/{id}/cancel",
            post(conversations::cancel_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            get(conversations::list_messages),
        )
        .route("/messages", post(messages::submit_query))
        .route("/research/stream", post(research::stream_research))
        .route("/research-results", get(research_results::list_results))
        .route(
            "/research-results/summaries",
            get(research_results::list_summaries),
        )
        .route(
            "/research-results/{id}/toggle",
            post(research_results::toggle_result),
        )
        .route(
            "/research-results/{id}/notes",
            put(research_results::update_notes),
        )
        .route(
            "/research-results/{id}",
            delete(research_results::delete_result),
        )
        .route("/migrations/run", post(system::run_migrations))
}

/// The full application: API routes, tracing, CORS and a body size limit
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", create_router())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
