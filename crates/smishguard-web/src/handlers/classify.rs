//! Message classification endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::state::SharedState;

/// Longest message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub message: String,
}

/// POST /api/classify: returns a `Verdict`. Service failures come back as
/// an `undetermined` verdict with status 200; only invalid input is a 4xx.
pub async fn api_classify(
    State(state): State<SharedState>,
    Json(body): Json<ClassifyRequest>,
) -> impl IntoResponse {
    let message = body.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "message must not be empty"})),
        )
            .into_response();
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({
                "error": format!("message too long (max {MAX_MESSAGE_CHARS} characters)")
            })),
        )
            .into_response();
    }

    let verdict = state.classifier.classify(message).await;
    info!(label = %verdict.label, confidence = %verdict.confidence, "classified via API");
    Json(verdict).into_response()
}
