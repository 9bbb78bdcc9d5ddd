//! Audit records for generation calls.
//! Entries are emitted as structured log events; nothing is persisted.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningAuditEntry {
    pub id: Uuid,
    pub deployment: String,
    pub context_examples: usize,
    pub output_hash: String,
    pub output_chars: usize,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl ReasoningAuditEntry {
    pub fn new(deployment: String, context_examples: usize, output: &str, latency_ms: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            deployment,
            context_examples,
            output_hash,
            output_chars: output.chars().count(),
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            audit_id = %self.id,
            deployment = %self.deployment,
            context_examples = self.context_examples,
            output_hash = %self.output_hash,
            output_chars = self.output_chars,
            latency_ms = self.latency_ms,
            "reasoning call completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_hash_is_stable_sha256() {
        let a = ReasoningAuditEntry::new("dep".into(), 3, "1. Final verdict: smishing", 120);
        let b = ReasoningAuditEntry::new("dep".into(), 3, "1. Final verdict: smishing", 80);
        assert_eq!(a.output_hash, b.output_hash);
        assert_eq!(a.output_hash.len(), 64);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_output_chars_counts_characters_not_bytes() {
        let e = ReasoningAuditEntry::new("dep".into(), 0, "스미싱", 1);
        assert_eq!(e.output_chars, 3);
    }
}
