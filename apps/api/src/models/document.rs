use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored resume as handed over by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeDocument {
    pub resume_id: i64,
    pub resume_text: String,
    pub uploaded_at: Option<NaiveDateTime>,
}

impl ResumeDocument {
    /// Resumes carry no title of their own; the UI shows this label.
    pub fn title(&self) -> String {
        format!("Resume {}", self.resume_id)
    }
}

/// Job listing shape shared with the job catalog: `{ job_id, title, description }`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub job_id: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<NaiveDateTime>,
}
