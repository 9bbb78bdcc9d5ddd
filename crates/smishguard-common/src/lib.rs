//! smishguard-common: Shared types and errors used across all SmishGuard crates.

pub mod error;
pub mod verdict;

// Re-export commonly used types
pub use error::{Result, SmishError};
pub use verdict::{Confidence, Label, Verdict};
