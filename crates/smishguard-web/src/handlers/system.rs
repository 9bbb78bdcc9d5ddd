//! Service health.

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` once the example index is loaded, `starting` before.
    pub status: &'static str,
    pub known_messages: usize,
    pub known_urls: usize,
    pub index_examples: Option<usize>,
    pub top_k: usize,
    pub uptime_secs: u64,
}

/// GET /api/health
pub async fn api_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let classifier = &state.classifier;
    let gateway = classifier.gateway();

    Json(HealthResponse {
        status: if gateway.is_ready() { "ok" } else { "starting" },
        known_messages: classifier.known().message_count(),
        known_urls: classifier.known().url_count(),
        index_examples: gateway.index_len(),
        top_k: classifier.top_k(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
