//! smishguard-web: JSON API over the classifier.
//!   POST /api/classify: classify one message
//!   GET  /api/health: readiness and loaded data sizes

pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::{AppState, SharedState};
