pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

/// Bodies may carry two texts (resume and job) plus JSON escaping, so the
/// limit is a multiple of the per-text limit, never below axum's 2 MiB.
const MIN_BODY_LIMIT: usize = 2 * 1024 * 1024;

pub fn body_limit(max_text_bytes: usize) -> usize {
    max_text_bytes
        .saturating_mul(4)
        .saturating_add(64 * 1024)
        .max(MIN_BODY_LIMIT)
}

pub fn build_router(state: AppState) -> Router {
    let limit = body_limit(state.engine.settings().max_text_bytes);
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Match API
        .route("/match", post(handlers::handle_match))
        .route("/match/text", post(handlers::handle_match_text))
        .route(
            "/match/:resume_id/:job_id",
            get(handlers::handle_get_match),
        )
        .route("/extract", post(handlers::handle_extract))
        // Vocabulary + catalog passthrough
        .route("/skills", get(handlers::handle_list_skills))
        .route("/jobs", get(handlers::handle_list_jobs))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_scales_with_text_limit() {
        assert_eq!(body_limit(200_000), MIN_BODY_LIMIT);
        assert_eq!(body_limit(3_000_000), 12_000_000 + 64 * 1024);
        assert_eq!(body_limit(usize::MAX), usize::MAX);
    }
}
