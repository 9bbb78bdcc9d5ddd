//! Two-stage classification pipeline.
//!
//! Stage 1 is deterministic: an exact known message or a known URL inside
//! the message yields `Smishing` at full confidence without touching any
//! external service. Stage 2 retrieves similar examples, calls the reasoning
//! service and parses its answer. Any failure in stage 2 becomes a failure
//! verdict; `classify` itself never errors.

use std::future::Future;
use std::sync::Arc;

use smishguard_common::{SmishError, Verdict};
use smishguard_embed::EmbeddingGateway;
use smishguard_llm::{ReasoningBackend, ReasoningRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::known::KnownItemStore;
use crate::parser::parse_response;
use crate::urls::extract_urls;

pub const DEFAULT_TOP_K: usize = 3;

pub const KNOWN_MESSAGE_REASON: &str = "matched known fraudulent message";
pub const KNOWN_URL_REASON: &str = "matched known fraudulent URL";

pub struct SmishingClassifier {
    known: Arc<KnownItemStore>,
    gateway: Arc<EmbeddingGateway>,
    reasoning: Arc<dyn ReasoningBackend>,
    top_k: usize,
}

impl SmishingClassifier {
    pub fn new(
        known: Arc<KnownItemStore>,
        gateway: Arc<EmbeddingGateway>,
        reasoning: Arc<dyn ReasoningBackend>,
    ) -> Self {
        Self { known, gateway, reasoning, top_k: DEFAULT_TOP_K }
    }

    /// Number of similar examples passed to the reasoning service. Zero is
    /// raised to one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Startup barrier: build and load the example index before serving.
    pub async fn initialize(&self) -> Result<(), SmishError> {
        let index = self.gateway.ensure_ready().await?;
        info!(
            examples = index.len(),
            known_messages = self.known.message_count(),
            known_urls = self.known.url_count(),
            reasoning_model = self.reasoning.model_id(),
            "classifier ready"
        );
        Ok(())
    }

    pub fn known(&self) -> &KnownItemStore {
        &self.known
    }

    pub fn gateway(&self) -> &EmbeddingGateway {
        &self.gateway
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn classify(&self, message: &str) -> Verdict {
        self.classify_with_cancel(message, &CancellationToken::new()).await
    }

    /// Same as `classify`, abandoning the external stages once `cancel`
    /// fires. A cancelled call returns the "classification cancelled"
    /// failure verdict.
    #[instrument(skip_all, fields(chars = message.chars().count()))]
    pub async fn classify_with_cancel(&self, message: &str, cancel: &CancellationToken) -> Verdict {
        let message = message.trim();

        if self.known.contains(message) {
            info!("known fraudulent message");
            return Verdict::known_match(KNOWN_MESSAGE_REASON);
        }

        let urls = extract_urls(message);
        if self.known.contains_any(urls.iter().copied()) {
            info!(urls = urls.len(), "known fraudulent URL");
            return Verdict::known_match(KNOWN_URL_REASON);
        }

        match self.assess(message, cancel).await {
            Ok(verdict) => {
                info!(
                    label = %verdict.label,
                    confidence = %verdict.confidence,
                    "model verdict"
                );
                verdict
            }
            Err(e) => {
                warn!(error = %e, "classification failed");
                Verdict::failure(e.to_string())
            }
        }
    }

    async fn assess(&self, message: &str, cancel: &CancellationToken) -> Result<Verdict, SmishError> {
        let similar = until_cancelled(cancel, self.gateway.retrieve(message, self.top_k)).await?;
        debug!(
            retrieved = similar.len(),
            top_score = similar.first().map(|s| s.score),
            "similar examples retrieved"
        );

        let request = ReasoningRequest::new(message, similar.iter().map(|s| s.text.as_str()));
        let raw = until_cancelled(cancel, self.reasoning.generate(&request)).await?;

        Ok(parse_response(&raw))
    }
}

async fn until_cancelled<F, T, E>(cancel: &CancellationToken, fut: F) -> Result<T, SmishError>
where
    F: Future<Output = Result<T, E>>,
    SmishError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SmishError::Cancelled),
        res = fut => res.map_err(SmishError::from),
    }
}
