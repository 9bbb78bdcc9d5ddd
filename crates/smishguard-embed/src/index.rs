//! In-memory view of the persisted example index.
//!
//! The index directory holds one or more `*.jsonl` files; each non-blank
//! line is a `StoredExample`. Files are read in name order so ranks are
//! reproducible for equal scores.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::similarity::{dot, l2_normalize};
use crate::{EmbedError, Result};

/// One labelled example as persisted by the build step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredExample {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A stored example returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedExample {
    pub text: String,
    /// 1-based position in the result list.
    pub rank: usize,
    /// Cosine similarity to the query.
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    texts: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dim: Option<usize>,
}

/// True when `dir` exists and contains at least one entry.
pub fn is_index_present(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from examples. All embeddings must share one non-zero dimension.
    pub fn from_examples(examples: Vec<StoredExample>) -> Result<Self> {
        let mut index = Self::empty();
        for example in examples {
            index.push(example)?;
        }
        Ok(index)
    }

    fn push(&mut self, example: StoredExample) -> Result<()> {
        let StoredExample { text, mut embedding } = example;
        let actual = embedding.len();
        match self.dim {
            Some(expected) if expected != actual => {
                return Err(EmbedError::DimensionMismatch { expected, actual });
            }
            None if actual == 0 => {
                return Err(EmbedError::DimensionMismatch { expected: 1, actual: 0 });
            }
            None => self.dim = Some(actual),
            Some(_) => {}
        }
        l2_normalize(&mut embedding);
        self.texts.push(text);
        self.vectors.push(embedding);
        Ok(())
    }

    /// Load every `*.jsonl` file in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect();
        files.sort();

        let mut index = Self::empty();
        for file in &files {
            let content = std::fs::read_to_string(file)?;
            for (i, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let corrupt = |reason: String| EmbedError::Corrupt {
                    path: file.clone(),
                    line: i + 1,
                    reason,
                };
                let example: StoredExample =
                    serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
                index.push(example).map_err(|e| corrupt(e.to_string()))?;
            }
            debug!(file = %file.display(), "index file loaded");
        }

        info!(
            dir = %dir.display(),
            files = files.len(),
            examples = index.len(),
            "embedding index loaded"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// Top-`k` examples by cosine similarity, best first.
    ///
    /// Returns fewer than `k` when the index is smaller and an empty list for
    /// an empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedExample>> {
        let Some(dim) = self.dim else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(EmbedError::DimensionMismatch { expected: dim, actual: query.len() });
        }

        let mut q = query.to_vec();
        l2_normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&q, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(pos, (i, score))| RetrievedExample {
                text: self.texts[i].clone(),
                rank: pos + 1,
                score,
            })
            .collect())
    }
}
