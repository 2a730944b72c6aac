use super::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

/// Chat request body. Both fields are required: a missing `message` or
/// `rulebook` is rejected up front instead of flowing into the prompt.
#[derive(Debug, serde::Deserialize)]
pub struct ChatBody {
    pub message: String,
    pub rulebook: String,
}

/// GET /health — liveness, no session state touched
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "sessions": state.registry.active().await,
    });
    Json(body)
}

/// POST /chat — one moderation turn against the routed session
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> impl IntoResponse {
    let Json(chat) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let err = serde_json::json!({
                "error": format!(
                    "Invalid JSON: {rejection}. Expected: {{\"message\": \"...\", \"rulebook\": \"...\"}}"
                )
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let store = state.registry.resolve(&state.session_name).await;
    match state
        .orchestrator
        .process_turn(&store, &chat.message, &chat.rulebook)
        .await
    {
        Ok(verdict) => (StatusCode::OK, Json(serde_json::json!({ "response": verdict }))),
        Err(error) => {
            tracing::error!(session = %store.id(), "moderation turn failed: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": error.to_string() })),
            )
        }
    }
}
