use axum::{Json, extract::State};
use serde_json::Value;

use crate::api::state::AppState;
use crate::api_response::{error, success};
use crate::error::ChatError;
use crate::models::ChatRequest;
use crate::services;

// POST /api/chat
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<Value> {
    let user_id = request.user_id.clone();

    match services::chat::handle_turn(&state, request).await {
        Ok(response) => success(response),
        Err(ChatError::InvalidRequest(message)) => error(message),
        Err(err @ ChatError::OptInRequired) => error(err.to_string()),
        Err(err) => {
            // Internal taxonomy stays in the logs; the caller gets a retry
            // signal without details.
            tracing::error!(%user_id, error = %err, "chat turn failed");
            error("Something went wrong, please try again".to_string())
        }
    }
}
