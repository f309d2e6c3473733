//! Axum route handlers for the Match API.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::matching::assembler::MatchResponse;
use crate::matching::engine::{JobRequirements, Vocabulary};
use crate::models::document::JobPosting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `{ resume_id, job_id }`, accepted as multipart form data (what the UI
/// sends), url-encoded form, or JSON.
#[derive(Debug, Deserialize)]
pub struct MatchIdsRequest {
    pub resume_id: i64,
    pub job_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TextMatchRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_text: Option<String>,
    /// Explicit requirement list; wins over `job_text` when both are given.
    #[serde(default)]
    pub job_skills: Option<Vec<String>>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub resume_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub skills: Vec<String>,
}

#[async_trait]
impl<S> FromRequest<S> for MatchIdsRequest
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return ids_from_multipart(multipart).await;
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(ids) = Form::<Self>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(ids);
        }

        let Json(ids) = Json::<Self>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(ids)
    }
}

async fn ids_from_multipart(mut multipart: Multipart) -> Result<MatchIdsRequest, AppError> {
    let mut resume_id = None;
    let mut job_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        match name.as_str() {
            "resume_id" => resume_id = Some(parse_id("resume_id", &value)?),
            "job_id" => job_id = Some(parse_id("job_id", &value)?),
            _ => {}
        }
    }

    Ok(MatchIdsRequest {
        resume_id: resume_id
            .ok_or_else(|| AppError::Validation("resume_id is required".to_string()))?,
        job_id: job_id.ok_or_else(|| AppError::Validation("job_id is required".to_string()))?,
    })
}

fn parse_id(field: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer, got '{raw}'")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /match
///
/// Resolves both ids through the document store and scores the resume
/// against the job description.
pub async fn handle_match(
    State(state): State<AppState>,
    request: MatchIdsRequest,
) -> Result<Json<MatchResponse>, AppError> {
    match_stored(&state, request.resume_id, request.job_id).await
}

/// GET /match/:resume_id/:job_id
///
/// Same computation as `POST /match`. Results are not stored, so this
/// recomputes; identical inputs give an identical payload.
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path((resume_id, job_id)): Path<(i64, i64)>,
) -> Result<Json<MatchResponse>, AppError> {
    match_stored(&state, resume_id, job_id).await
}

async fn match_stored(
    state: &AppState,
    resume_id: i64,
    job_id: i64,
) -> Result<Json<MatchResponse>, AppError> {
    let resume = state.store.resume(resume_id).await?;
    let job = state.store.job(job_id).await?;

    let (resume, job) = match (resume, job) {
        (Some(resume), Some(job)) => (resume, job),
        _ => return Err(AppError::NotFound("Resume or job not found".to_string())),
    };

    let response = state.engine.match_documents(&resume, &job)?;
    info!(
        "Matched resume {resume_id} against job {job_id}: score {}",
        response.score
    );
    Ok(Json(response))
}

/// POST /match/text
///
/// Ad-hoc match of raw texts, bypassing the document store.
pub async fn handle_match_text(
    State(state): State<AppState>,
    Json(request): Json<TextMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let requirements = match (&request.job_skills, &request.job_text) {
        (Some(skills), _) => JobRequirements::Listed(skills),
        (None, Some(text)) => JobRequirements::Text(text),
        (None, None) => {
            return Err(AppError::Validation(
                "either job_text or job_skills is required".to_string(),
            ))
        }
    };

    let response = state.engine.match_texts(
        &request.resume_text,
        requirements,
        request.job_title.clone(),
        request.resume_title.clone(),
    )?;
    Ok(Json(response))
}

/// POST /extract
///
/// Previews the canonical skills found in a text.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let skills = state.engine.extract_preview(&request.text)?;
    Ok(Json(ExtractResponse { skills }))
}

/// GET /skills
pub async fn handle_list_skills(State(state): State<AppState>) -> Json<Vocabulary> {
    Json(state.engine.vocabulary())
}

/// GET /jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(state.store.jobs().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::matching::cache::ExtractionCache;
    use crate::matching::engine::{EngineSettings, MatchEngine};
    use crate::matching::taxonomy::SharedTaxonomy;
    use crate::matching::vocabulary::builtin_taxonomy;
    use crate::routes::build_router;
    use crate::store::InMemoryDocumentStore;

    fn test_state(max_text_bytes: usize) -> AppState {
        let store = InMemoryDocumentStore::new();
        store.insert_resume(1, "Experienced in Python and JS.");
        store.insert_resume(2, "");
        store.insert_job(10, "Backend Developer", "Python, SQL and JavaScript");
        store.insert_job(11, "Generalist", "Curious people welcome.");

        AppState {
            engine: Arc::new(MatchEngine::new(
                SharedTaxonomy::new(builtin_taxonomy().unwrap()),
                ExtractionCache::new(32),
                EngineSettings { max_text_bytes },
            )),
            store: Arc::new(store),
        }
    }

    async fn send(state: AppState, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn json_post(uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_match_json_scenario() {
        let (status, body) = send(
            test_state(10_000),
            json_post("/match", json!({"resume_id": 1, "job_id": 10})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "score": 66.7,
                "matched_skills": ["javascript", "python"],
                "missing_skills": ["sql"],
                "job_title": "Backend Developer",
                "resume_title": "Resume 1"
            })
        );
    }

    #[tokio::test]
    async fn test_match_multipart_form() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"resume_id\"\r\n\r\n1\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"job_id\"\r\n\r\n10\r\n--{b}--\r\n",
            b = boundary
        );
        let request = HttpRequest::post("/match")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(test_state(10_000), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], json!(66.7));
    }

    #[tokio::test]
    async fn test_match_urlencoded_form() {
        let request = HttpRequest::post("/match")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("resume_id=2&job_id=10"))
            .unwrap();

        let (status, body) = send(test_state(10_000), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], json!(0.0));
        assert_eq!(body["missing_skills"], json!(["javascript", "python", "sql"]));
    }

    #[tokio::test]
    async fn test_match_unknown_ids_is_404() {
        let (status, body) = send(
            test_state(10_000),
            json_post("/match", json!({"resume_id": 99, "job_id": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_get_match_recomputes_identically() {
        let state = test_state(10_000);
        let uri = "/match/1/10";
        let (_, first) = send(state.clone(), HttpRequest::get(uri).body(Body::empty()).unwrap()).await;
        let (status, second) =
            send(state, HttpRequest::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_job_without_skills_scores_100() {
        let (status, body) = send(
            test_state(10_000),
            HttpRequest::get("/match/1/11").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], json!(100.0));
        assert_eq!(body["matched_skills"], json!([]));
    }

    #[tokio::test]
    async fn test_match_text_with_listed_skills() {
        let (status, body) = send(
            test_state(10_000),
            json_post(
                "/match/text",
                json!({
                    "resume_text": "Rust and Go services on Kubernetes",
                    "job_skills": ["rust", "k8s", "terraform"],
                    "job_text": "ignored when skills are listed"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["matched_skills"], json!(["kubernetes", "rust"]));
        assert_eq!(body["missing_skills"], json!(["terraform"]));
        assert!(body.get("job_title").is_none());
    }

    #[tokio::test]
    async fn test_match_text_requires_job() {
        let (status, body) = send(
            test_state(10_000),
            json_post("/match/text", json!({"resume_text": "Python"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn test_oversized_text_is_413() {
        let (status, body) = send(
            test_state(64),
            json_post(
                "/match/text",
                json!({"resume_text": "python ".repeat(20), "job_text": "python"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], json!("INPUT_TOO_LARGE"));
    }

    #[tokio::test]
    async fn test_extract_preview() {
        let (status, body) = send(
            test_state(10_000),
            json_post("/extract", json!({"text": "Node.js, React and PostgreSQL"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["node.js", "postgresql", "react"]));
    }

    #[tokio::test]
    async fn test_list_jobs_and_skills() {
        let state = test_state(10_000);
        let (status, jobs) =
            send(state.clone(), HttpRequest::get("/jobs").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(jobs[0], json!({"job_id": 10, "title": "Backend Developer", "description": "Python, SQL and JavaScript"}));

        let (status, skills) =
            send(state, HttpRequest::get("/skills").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(skills["version"], json!(0));
        assert!(skills["skills"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s["name"] == json!("javascript") && s["aliases"] == json!(["ecmascript", "js"])));
    }

    #[tokio::test]
    async fn test_health_reports_store_and_taxonomy() {
        let (status, body) = send(
            test_state(10_000),
            HttpRequest::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert_eq!(body["store"], json!("memory"));
        assert_eq!(body["taxonomy_version"], json!(0));
        assert_eq!(body["extraction_cache"]["entries"], json!(0));
    }

    #[tokio::test]
    async fn test_body_limit_follows_text_limit() {
        let max_text_bytes = 3 * 1024 * 1024;
        let within = "python ".repeat(400_000);
        let (status, body) = send(
            test_state(max_text_bytes),
            json_post("/match/text", json!({"resume_text": within, "job_text": "python"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], json!(100.0));

        let oversized = "python ".repeat(500_000);
        let (status, body) = send(
            test_state(max_text_bytes),
            json_post("/match/text", json!({"resume_text": oversized, "job_text": "python"})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], json!("INPUT_TOO_LARGE"));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(parse_id("job_id", "abc"), Err(AppError::Validation(_))));
        assert_eq!(parse_id("job_id", " 42 ").unwrap(), 42);
    }
}
