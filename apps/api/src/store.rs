//! Document store: read-only access to resumes and job postings.
//!
//! Upload, storage and job CRUD belong to other services; the matcher only
//! needs to turn an id into text. `AppState` holds an
//! `Arc<dyn DocumentStore>`: Postgres when `DATABASE_URL` is set,
//! in-memory otherwise.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::document::{JobPosting, ResumeDocument};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn resume(&self, resume_id: i64) -> Result<Option<ResumeDocument>, AppError>;

    async fn job(&self, job_id: i64) -> Result<Option<JobPosting>, AppError>;

    async fn jobs(&self) -> Result<Vec<JobPosting>, AppError>;

    /// Short label for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

/// Reads the `resumes` and `jobs` tables owned by the upload/catalog services.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn resume(&self, resume_id: i64) -> Result<Option<ResumeDocument>, AppError> {
        let row = sqlx::query_as::<_, ResumeDocument>(
            r#"
            SELECT resume_id::BIGINT AS resume_id, resume_text, uploaded_at
            FROM resumes
            WHERE resume_id = $1
            "#,
        )
        .bind(resume_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn job(&self, job_id: i64) -> Result<Option<JobPosting>, AppError> {
        let row = sqlx::query_as::<_, JobPosting>(
            r#"
            SELECT job_id::BIGINT AS job_id, title, description, posted_at
            FROM jobs
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        let rows = sqlx::query_as::<_, JobPosting>(
            "SELECT job_id::BIGINT AS job_id, title, description, posted_at FROM jobs ORDER BY job_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryDocumentStore {
    resumes: RwLock<BTreeMap<i64, ResumeDocument>>,
    jobs: RwLock<BTreeMap<i64, JobPosting>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a sample resume and five job postings, so the
    /// service is usable without a database.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        store.insert_resume(1, DEMO_RESUME);
        for (idx, (title, description)) in DEMO_JOBS.iter().enumerate() {
            store.insert_job(idx as i64 + 1, title, description);
        }
        store
    }

    pub fn insert_resume(&self, resume_id: i64, text: &str) {
        self.resumes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                resume_id,
                ResumeDocument {
                    resume_id,
                    resume_text: text.to_string(),
                    uploaded_at: None,
                },
            );
    }

    pub fn insert_job(&self, job_id: i64, title: &str, description: &str) {
        self.jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                job_id,
                JobPosting {
                    job_id,
                    title: title.to_string(),
                    description: description.to_string(),
                    posted_at: None,
                },
            );
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn resume(&self, resume_id: i64) -> Result<Option<ResumeDocument>, AppError> {
        Ok(self
            .resumes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&resume_id)
            .cloned())
    }

    async fn job(&self, job_id: i64) -> Result<Option<JobPosting>, AppError> {
        Ok(self
            .jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&job_id)
            .cloned())
    }

    async fn jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        Ok(self
            .jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

const DEMO_RESUME: &str = "Experienced Python developer with 5 years of experience in web \
development using Django and Flask. Proficient in SQL, JavaScript, and React. Experience with \
Docker and AWS. Strong background in machine learning with scikit-learn and pandas. Familiar \
with Git, Linux, and REST API development.";

const DEMO_JOBS: &[(&str, &str)] = &[
    (
        "Senior Python Developer",
        "Looking for a senior Python developer with experience in Django, Flask, SQL, and cloud \
         technologies like AWS. Knowledge of Docker and CI/CD is a plus. Must have experience \
         with Git and Linux environments.",
    ),
    (
        "Full Stack Developer",
        "Seeking a full-stack developer proficient in React, Node.js, Python, and PostgreSQL. \
         Experience with REST APIs and microservices architecture preferred. Knowledge of \
         JavaScript, HTML, CSS, and modern web frameworks required.",
    ),
    (
        "Data Scientist",
        "Looking for a data scientist with expertise in Python, machine learning, pandas, numpy, \
         and scikit-learn. Experience with TensorFlow or PyTorch is required. Knowledge of SQL \
         and data visualization tools preferred.",
    ),
    (
        "DevOps Engineer",
        "Seeking a DevOps engineer with experience in AWS, Docker, Kubernetes, and CI/CD \
         pipelines. Knowledge of Terraform, Ansible, and monitoring tools. Linux administration \
         skills required.",
    ),
    (
        "Frontend Developer",
        "Looking for a frontend developer skilled in React, JavaScript, TypeScript, HTML, CSS, \
         and modern build tools like Webpack. Experience with testing frameworks like Jest \
         preferred.",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let store = InMemoryDocumentStore::new();
        store.insert_resume(4, "Rust and Go");
        store.insert_job(9, "Backend", "Go services");

        let resume = store.resume(4).await.unwrap().unwrap();
        assert_eq!(resume.resume_text, "Rust and Go");
        assert_eq!(resume.title(), "Resume 4");
        assert_eq!(store.job(9).await.unwrap().unwrap().title, "Backend");
    }

    #[tokio::test]
    async fn test_unknown_ids_are_none() {
        let store = InMemoryDocumentStore::new();
        assert!(store.resume(1).await.unwrap().is_none());
        assert!(store.job(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_demo_data_lists_jobs_in_id_order() {
        let store = InMemoryDocumentStore::with_demo_data();
        let jobs = store.jobs().await.unwrap();
        assert_eq!(jobs.len(), 5);
        assert_eq!(jobs[0].job_id, 1);
        assert_eq!(jobs[0].title, "Senior Python Developer");
        assert_eq!(jobs[4].title, "Frontend Developer");
        assert!(store.resume(1).await.unwrap().is_some());
    }

    #[test]
    fn test_job_listing_shape() {
        let job = JobPosting {
            job_id: 3,
            title: "Data Scientist".to_string(),
            description: "Python".to_string(),
            posted_at: None,
        };
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            serde_json::json!({"job_id": 3, "title": "Data Scientist", "description": "Python"})
        );
    }
}
