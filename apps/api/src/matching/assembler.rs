//! Result Assembler: shapes a `MatchResult` into the `/match` response contract.

use serde::{Deserialize, Serialize};

use crate::matching::matcher::MatchResult;

/// Wire shape consumed by the UI. Titles are optional and omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_title: Option<String>,
}

/// Titles are resolved by the caller; nothing is looked up here.
pub fn assemble(
    result: MatchResult,
    job_title: Option<String>,
    resume_title: Option<String>,
) -> MatchResponse {
    MatchResponse {
        score: result.score,
        matched_skills: result.matched,
        missing_skills: result.missing,
        job_title: non_blank(job_title),
        resume_title: non_blank(resume_title),
    }
}

fn non_blank(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}
