//! Reasoning and embedding backends for the hosted model platform.
//!
//! Backends:
//!   WatsonxGenerationClient: deployed prompt template, `/text/generation`
//!   WatsonxEmbeddingClient : `/text/embeddings`
//!
//! Both authenticate through a shared `TokenProvider`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use smishguard_common::SmishError;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::audit::ReasoningAuditEntry;
use crate::auth::TokenProvider;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("authentication failure: {0}")]
    Authentication(String),
    #[error("response parse failure: {reason}\nraw response: {body}")]
    ResponseParse { reason: String, body: String },
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

impl From<LlmError> for SmishError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Authentication(msg) => SmishError::Authentication(msg),
            other => SmishError::Reasoning(other.to_string()),
        }
    }
}

/// Status that makes a client drop its cached bearer token.
const UNAUTHORIZED: u16 = 401;

/// Shared HTTP client with a per-request timeout.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

// ── Request ───────────────────────────────────────────────────────────────────

/// Prompt variables sent to the deployed classification template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub user_input: String,
    pub similar_cases: String,
    #[serde(default)]
    pub context_examples: usize,
}

impl ReasoningRequest {
    /// Build a request; retrieved texts become one `- `-prefixed line each.
    pub fn new<I, S>(user_input: impl Into<String>, similar: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let similar: Vec<S> = similar.into_iter().collect();
        Self {
            user_input: user_input.into(),
            context_examples: similar.len(),
            similar_cases: format_similar_cases(similar),
        }
    }

    pub fn context_examples(&self) -> usize {
        self.context_examples
    }

    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "parameters": {
                "prompt_variables": {
                    "user_input":    self.user_input,
                    "similar_cases": self.similar_cases,
                }
            }
        })
    }
}

/// One `- `-prefixed line per example; line breaks inside an example are
/// flattened to single spaces.
pub fn format_similar_cases<I, S>(texts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .map(|t| format!("- {}", flatten_lines(t.as_ref())))
        .collect::<Vec<_>>()
        .join("\n")
}

fn flatten_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Traits ────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Run the classification prompt and return the trimmed generated text.
    async fn generate(&self, req: &ReasoningRequest) -> Result<String, LlmError>;
    fn model_id(&self) -> &str;
}

#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError>;
    fn model_id(&self) -> &str;
}

// ── Response parsing ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

/// Extract `results[0].generated_text`. Every failure keeps the raw body.
pub fn parse_generation_response(status: u16, body: &str) -> Result<String, LlmError> {
    let fail = |reason: String| LlmError::ResponseParse { reason, body: body.to_string() };

    if !(200..300).contains(&status) {
        return Err(fail(format!("generation endpoint returned status {status}")));
    }

    let parsed: GenerationResponse =
        serde_json::from_str(body).map_err(|e| fail(e.to_string()))?;

    parsed
        .results
        .into_iter()
        .next()
        .map(|r| r.generated_text.trim().to_string())
        .ok_or_else(|| fail("results array is empty".to_string()))
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    results: Vec<EmbeddingResult>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResult {
    embedding: Vec<f32>,
}

pub fn parse_embedding_response(status: u16, body: &str) -> Result<Vec<f32>, LlmError> {
    if !(200..300).contains(&status) {
        return Err(LlmError::ApiError { status, message: body.to_string() });
    }

    let parsed: EmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        LlmError::ResponseParse { reason: e.to_string(), body: body.to_string() }
    })?;

    match parsed.results.into_iter().next() {
        Some(r) if !r.embedding.is_empty() => Ok(r.embedding),
        _ => Err(LlmError::ResponseParse {
            reason: "no embedding in response".to_string(),
            body: body.to_string(),
        }),
    }
}

// ── 1. Generation ─────────────────────────────────────────────────────────────

pub struct WatsonxGenerationClient {
    endpoint: String,
    deployment_id: String,
    tokens: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl WatsonxGenerationClient {
    pub fn new(
        cloud_url: &str,
        deployment_id: impl Into<String>,
        api_version: &str,
        tokens: Arc<dyn TokenProvider>,
        client: reqwest::Client,
    ) -> Self {
        let deployment_id = deployment_id.into();
        let endpoint = format!(
            "{}/ml/v1/deployments/{}/text/generation?version={}",
            cloud_url.trim_end_matches('/'),
            deployment_id,
            api_version
        );
        Self { endpoint, deployment_id, tokens, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReasoningBackend for WatsonxGenerationClient {
    #[instrument(skip(self, req), fields(deployment = %self.deployment_id, context_examples = req.context_examples()))]
    async fn generate(&self, req: &ReasoningRequest) -> Result<String, LlmError> {
        let token = self.tokens.access_token().await?;
        let started = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.expose())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&req.payload())
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!(status, bytes = body.len(), "generation response received");
        if status == UNAUTHORIZED {
            self.tokens.invalidate().await;
        }

        let text = parse_generation_response(status, &body)?;

        ReasoningAuditEntry::new(
            self.deployment_id.clone(),
            req.context_examples(),
            &text,
            started.elapsed().as_millis() as u64,
        )
        .emit();

        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.deployment_id
    }
}

// ── 2. Embeddings ─────────────────────────────────────────────────────────────

pub struct WatsonxEmbeddingClient {
    endpoint: String,
    model: String,
    project_id: String,
    tokens: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl WatsonxEmbeddingClient {
    pub fn new(
        cloud_url: &str,
        model: impl Into<String>,
        project_id: impl Into<String>,
        api_version: &str,
        tokens: Arc<dyn TokenProvider>,
        client: reqwest::Client,
    ) -> Self {
        let endpoint = format!(
            "{}/ml/v1/text/embeddings?version={}",
            cloud_url.trim_end_matches('/'),
            api_version
        );
        Self { endpoint, model: model.into(), project_id: project_id.into(), tokens, client }
    }
}

#[async_trait]
impl EmbeddingBackend for WatsonxEmbeddingClient {
    #[instrument(skip(self, text), fields(model = %self.model, chars = text.len()))]
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let token = self.tokens.access_token().await?;
        let body = serde_json::json!({
            "inputs":     [text],
            "model_id":   &self.model,
            "project_id": &self.project_id,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if status == UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        parse_embedding_response(status, &body)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
