//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Instant;

use smishguard_classifier::SmishingClassifier;

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<SmishingClassifier>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(classifier: Arc<SmishingClassifier>) -> Self {
        Self { classifier, started_at: Instant::now() }
    }
}

pub type SharedState = Arc<AppState>;
