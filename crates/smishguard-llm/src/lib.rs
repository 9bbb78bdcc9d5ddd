//! smishguard-llm: clients for the hosted model platform.
//!
//! `auth` obtains and caches bearer tokens from the identity endpoint,
//! `backend` defines the reasoning/embedding traits and the watsonx
//! implementations, `audit` records each generation call.

pub mod audit;
pub mod auth;
pub mod backend;

pub use auth::{AccessToken, CachingTokenProvider, IamTokenProvider, TokenProvider};
pub use backend::{
    build_http_client, EmbeddingBackend, LlmError, ReasoningBackend, ReasoningRequest,
    WatsonxEmbeddingClient, WatsonxGenerationClient,
};
