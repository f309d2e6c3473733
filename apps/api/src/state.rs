use std::sync::Arc;

use crate::matching::engine::MatchEngine;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    /// Pluggable document store. Postgres when DATABASE_URL is set, in-memory otherwise.
    pub store: Arc<dyn DocumentStore>,
}
