use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Skill matcher is running" }))
}

/// GET /health
/// Returns service status plus the live taxonomy version and cache counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let vocabulary_version = state.engine.vocabulary_version();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "skillmatch-api",
        "store": state.store.backend(),
        "taxonomy_version": vocabulary_version,
        "extraction_cache": state.engine.cache_stats(),
    }))
}
