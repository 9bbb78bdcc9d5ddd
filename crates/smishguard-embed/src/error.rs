//! Error types for the embedding gateway.

use std::path::PathBuf;

use smishguard_common::SmishError;
use smishguard_llm::LlmError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedError>;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Index load failed: {0}")]
    Load(String),

    #[error("Corrupt index entry at {path}:{line}: {reason}")]
    Corrupt { path: PathBuf, line: usize, reason: String },

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LlmError> for EmbedError {
    fn from(e: LlmError) -> Self {
        EmbedError::Embedding(e.to_string())
    }
}

impl From<EmbedError> for SmishError {
    fn from(e: EmbedError) -> Self {
        match e {
            EmbedError::IndexBuild(msg) => SmishError::IndexBuild(msg),
            other => SmishError::Retrieval(other.to_string()),
        }
    }
}
