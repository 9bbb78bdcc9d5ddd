//! SmishGuard embedding index gateway.
//!
//! Keeps a persisted set of labelled example messages with their embedding
//! vectors and answers nearest-neighbour queries against it.
//!
//! # Features
//! - Index directory of `*.jsonl` files (`{"text": ..., "embedding": [...]}`)
//! - External build command run once when the directory is missing or empty
//! - Cosine-similarity top-k retrieval
//! - Query embedding through any `smishguard_llm::EmbeddingBackend`
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use smishguard_embed::{EmbeddingGateway, GatewayConfig};
//! # async fn run(embedder: Arc<dyn smishguard_llm::EmbeddingBackend>) -> smishguard_embed::Result<()> {
//! let gateway = EmbeddingGateway::new(GatewayConfig::default(), embedder);
//! gateway.ensure_ready().await?;
//! let similar = gateway.retrieve("Your parcel is on hold, pay the fee", 3).await?;
//! # Ok(()) }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod gateway;
pub mod index;
pub mod similarity;

pub use builder::IndexBuilder;
pub use config::GatewayConfig;
pub use error::{EmbedError, Result};
pub use gateway::EmbeddingGateway;
pub use index::{RetrievedExample, StoredExample, VectorIndex};
