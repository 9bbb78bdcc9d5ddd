//! Axum router: maps URL paths to handlers.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{classify::api_classify, system::api_health};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/classify", post(api_classify))
        .route("/api/health",   get(api_health))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use smishguard_classifier::{KnownItemStore, SmishingClassifier};
    use smishguard_embed::{EmbeddingGateway, GatewayConfig, VectorIndex};
    use smishguard_llm::{EmbeddingBackend, LlmError, ReasoningBackend, ReasoningRequest};
    use tower::ServiceExt;

    struct FlatEmbedder;

    #[async_trait]
    impl EmbeddingBackend for FlatEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![1.0])
        }
        fn model_id(&self) -> &str { "flat" }
    }

    struct CannedReasoner;

    #[async_trait]
    impl ReasoningBackend for CannedReasoner {
        async fn generate(&self, _req: &ReasoningRequest) -> Result<String, LlmError> {
            Ok("1. Final verdict: Benign\n2. Rationale: ordinary chat\n3. Risk level: 3%".into())
        }
        fn model_id(&self) -> &str { "canned" }
    }

    fn known() -> Arc<KnownItemStore> {
        Arc::new(KnownItemStore::from_lines(["win a free phone"], ["http://known-scam.biz/claim"]))
    }

    fn app() -> Router {
        let gateway = EmbeddingGateway::with_index(Arc::new(FlatEmbedder), VectorIndex::empty());
        let classifier = SmishingClassifier::new(known(), Arc::new(gateway), Arc::new(CannedReasoner));
        build_router(AppState::new(Arc::new(classifier)))
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn classify_request(body: Value) -> Request<Body> {
        Request::post("/api/classify")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_classify_known_url() {
        let (status, json) = call(
            app(),
            classify_request(serde_json::json!({"message": "Claim now http://known-scam.biz/claim"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["label"], "smishing");
        assert_eq!(json["confidence"], 1.0);
        assert_eq!(json["reason"], "matched known fraudulent URL");
    }

    #[tokio::test]
    async fn test_classify_through_model() {
        let (status, json) =
            call(app(), classify_request(serde_json::json!({"message": "see you at 7"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["label"], "benign");
        assert_eq!(json["reason"], "ordinary chat");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let (status, json) =
            call(app(), classify_request(serde_json::json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "message must not be empty");
    }

    #[tokio::test]
    async fn test_health_reports_counts() {
        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, json) = call(app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["known_messages"], 1);
        assert_eq!(json["known_urls"], 1);
        assert_eq!(json["index_examples"], 0);
    }

    #[tokio::test]
    async fn test_health_before_index_load() {
        let config = GatewayConfig::default().with_index_dir("/nonexistent/smishguard-index");
        let gateway = EmbeddingGateway::new(config, Arc::new(FlatEmbedder));
        let classifier = SmishingClassifier::new(known(), Arc::new(gateway), Arc::new(CannedReasoner));
        let app = build_router(AppState::new(Arc::new(classifier)));

        let req = Request::get("/api/health").body(Body::empty()).unwrap();
        let (_, json) = call(app, req).await;
        assert_eq!(json["status"], "starting");
        assert_eq!(json["index_examples"], Value::Null);
    }
}
