//! Embedding index gateway: build-once initialization, query embedding and
//! nearest-neighbour retrieval.

use std::sync::Arc;

use smishguard_llm::EmbeddingBackend;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::builder::IndexBuilder;
use crate::index::{is_index_present, RetrievedExample, VectorIndex};
use crate::{EmbedError, GatewayConfig, Result};

pub struct EmbeddingGateway {
    config: GatewayConfig,
    embedder: Arc<dyn EmbeddingBackend>,
    index: OnceCell<Arc<VectorIndex>>,
}

impl EmbeddingGateway {
    pub fn new(config: GatewayConfig, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self { config, embedder, index: OnceCell::new() }
    }

    /// Gateway over an already loaded index; `ensure_ready` never builds.
    pub fn with_index(embedder: Arc<dyn EmbeddingBackend>, index: VectorIndex) -> Self {
        Self {
            config: GatewayConfig::default(),
            embedder,
            index: OnceCell::new_with(Some(Arc::new(index))),
        }
    }

    /// Build the index if its directory is missing or empty, then load it.
    ///
    /// Runs at most once per gateway; concurrent callers wait for the first
    /// initialization. A failed attempt is not cached, so a later call retries.
    pub async fn ensure_ready(&self) -> Result<Arc<VectorIndex>> {
        self.index
            .get_or_try_init(|| self.initialize())
            .await
            .map(Arc::clone)
    }

    #[instrument(skip(self), fields(dir = %self.config.index_dir.display()))]
    async fn initialize(&self) -> Result<Arc<VectorIndex>> {
        let dir = self.config.index_dir.clone();

        if is_index_present(&dir) {
            info!("existing embedding index found, loading");
        } else {
            warn!("embedding index missing or empty, running build command");
            IndexBuilder::new(self.config.build_command.clone(), self.config.build_timeout)
                .run()
                .await?;
            if !is_index_present(&dir) {
                return Err(EmbedError::IndexBuild(format!(
                    "build command finished but {} is still empty",
                    dir.display()
                )));
            }
        }

        let index = tokio::task::spawn_blocking(move || VectorIndex::load(&dir))
            .await
            .map_err(|e| EmbedError::Load(e.to_string()))??;
        Ok(Arc::new(index))
    }

    pub fn is_ready(&self) -> bool {
        self.index.initialized()
    }

    /// Number of stored examples, once loaded.
    pub fn index_len(&self) -> Option<usize> {
        self.index.get().map(|i| i.len())
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embedder.embed_query(text).await?)
    }

    pub async fn similarity_search(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedExample>> {
        let index = self.ensure_ready().await?;
        index.search(vector, k)
    }

    /// Embed `text` and return its `k` nearest stored examples.
    pub async fn retrieve(&self, text: &str, k: usize) -> Result<Vec<RetrievedExample>> {
        self.ensure_ready().await?;
        let vector = self.embed_query(text).await?;
        self.similarity_search(&vector, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use smishguard_llm::LlmError;
    use std::time::Duration;

    use crate::StoredExample;

    /// Maps a text to a 2-d vector: parcel-ish texts point along x.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingBackend for KeywordEmbedder {
        async fn embed_query(&self, text: &str) -> std::result::Result<Vec<f32>, LlmError> {
            if text.contains("parcel") { Ok(vec![1.0, 0.0]) } else { Ok(vec![0.0, 1.0]) }
        }
        fn model_id(&self) -> &str { "keyword" }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingBackend for DownEmbedder {
        async fn embed_query(&self, _text: &str) -> std::result::Result<Vec<f32>, LlmError> {
            Err(LlmError::ApiError { status: 503, message: "embedding service down".into() })
        }
        fn model_id(&self) -> &str { "down" }
    }

    fn sh(script: String) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script]
    }

    #[test]
    fn test_retrieve_from_preloaded_index() {
        let index = VectorIndex::from_examples(vec![
            StoredExample { text: "your parcel is held".into(), embedding: vec![1.0, 0.0] },
            StoredExample { text: "dinner tonight?".into(), embedding: vec![0.0, 1.0] },
        ])
        .unwrap();
        let gateway = EmbeddingGateway::with_index(Arc::new(KeywordEmbedder), index);

        assert!(gateway.is_ready());
        let hits = tokio_test::block_on(gateway.retrieve("parcel customs fee", 1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "your parcel is held");
    }

    #[tokio::test]
    async fn test_embedding_failure_is_surfaced() {
        let gateway = EmbeddingGateway::with_index(Arc::new(DownEmbedder), VectorIndex::empty());
        let err = gateway.retrieve("anything", 3).await.unwrap_err();
        assert!(matches!(err, EmbedError::Embedding(_)));
        assert!(err.to_string().contains("embedding service down"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_index_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.jsonl"),
            "{\"text\":\"pay now\",\"embedding\":[1.0,0.0]}\n",
        )
        .unwrap();

        // `false` would fail the build if it ran
        let config = GatewayConfig::default()
            .with_index_dir(dir.path())
            .with_build_command(["false"]);
        let gateway = EmbeddingGateway::new(config, Arc::new(KeywordEmbedder));

        let index = gateway.ensure_ready().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(gateway.index_len(), Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_runs_once_under_concurrency() {
        let root = tempfile::tempdir().unwrap();
        let index_dir = root.path().join("store");
        let counter = root.path().join("runs.log");
        let script = format!(
            "echo run >> '{counter}' && sleep 0.2 && mkdir -p '{dir}' && \
             echo '{{\"text\":\"parcel fee\",\"embedding\":[1.0,0.0]}}' > '{dir}/index.jsonl'",
            counter = counter.display(),
            dir = index_dir.display(),
        );
        let config = GatewayConfig::default()
            .with_index_dir(&index_dir)
            .with_build_command(sh(script))
            .with_build_timeout(Duration::from_secs(10));
        let gateway = Arc::new(EmbeddingGateway::new(config, Arc::new(KeywordEmbedder)));

        let (a, b, c) = tokio::join!(
            gateway.ensure_ready(),
            gateway.ensure_ready(),
            gateway.ensure_ready()
        );
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        assert_eq!(c.unwrap().len(), 1);

        let runs = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_leaving_directory_empty_is_error() {
        let root = tempfile::tempdir().unwrap();
        let config = GatewayConfig::default()
            .with_index_dir(root.path().join("never-created"))
            .with_build_command(["true"]);
        let gateway = EmbeddingGateway::new(config, Arc::new(KeywordEmbedder));

        let err = gateway.ensure_ready().await.unwrap_err();
        assert!(matches!(err, EmbedError::IndexBuild(_)));
        assert!(!gateway.is_ready());
    }
}
