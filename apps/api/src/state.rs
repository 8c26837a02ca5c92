use std::sync::Arc;

use crate::extraction::orchestrator::ResumeExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Holds the oracle, prompts and schema; shared by every request.
    pub extractor: Arc<ResumeExtractor>,
}
