use thiserror::Error;

/// Pipeline-level error. Lower crates convert their own error types into
/// one of these variants at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum SmishError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Known-item store error: {0}")]
    KnownItems(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Embedding or retrieval failed: {0}")]
    Retrieval(String),

    #[error("authentication failure: {0}")]
    Authentication(String),

    #[error("Reasoning service error: {0}")]
    Reasoning(String),

    #[error("classification cancelled")]
    Cancelled,
}

impl SmishError {
    /// True for errors that should abort process startup rather than be
    /// folded into a per-request verdict.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SmishError::Config(_) | SmishError::KnownItems(_))
    }
}

pub type Result<T> = std::result::Result<T, SmishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_message_mentions_failure() {
        let e = SmishError::Authentication("no access_token".into());
        assert_eq!(e.to_string(), "authentication failure: no access_token");
    }

    #[test]
    fn test_only_startup_errors_are_fatal() {
        assert!(SmishError::Config("API_KEY".into()).is_fatal());
        assert!(SmishError::KnownItems("missing".into()).is_fatal());
        assert!(!SmishError::Reasoning("502".into()).is_fatal());
        assert!(!SmishError::Cancelled.is_fatal());
    }
}
