//! Matcher: coverage of a job's required skills by a resume's skills.
//!
//! Pure and total: no I/O, no errors, same inputs give byte-identical output.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::matching::extractor::{sorted_names, SkillSet};
use crate::matching::taxonomy::{SkillId, Taxonomy};

/// Score reported when the job requires nothing.
pub const EMPTY_REQUIREMENTS_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Percentage in [0, 100], one decimal.
    pub score: f64,
    /// job ∩ resume, sorted by display name.
    pub matched: Vec<String>,
    /// job − resume, sorted by display name.
    pub missing: Vec<String>,
}

pub struct Matcher {
    taxonomy: Arc<Taxonomy>,
}

impl Matcher {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// Compares a resume's skills against a job's required skills.
    ///
    /// `score = 100 * |job ∩ resume| / |job|`. The job is the denominator:
    /// the question is how much of what the job needs the candidate has.
    pub fn compare(&self, resume: &SkillSet, job: &SkillSet) -> MatchResult {
        let (present, absent): (Vec<SkillId>, Vec<SkillId>) =
            job.iter().partition(|&id| resume.contains(id));
        let matched = sorted_names(present.into_iter(), &self.taxonomy);
        let missing = sorted_names(absent.into_iter(), &self.taxonomy);

        MatchResult {
            score: coverage_score(matched.len(), job.len()),
            matched,
            missing,
        }
    }
}

/// Coverage percentage rounded to one decimal.
pub fn coverage_score(matched: usize, required: usize) -> f64 {
    if required == 0 {
        return EMPTY_REQUIREMENTS_SCORE;
    }
    let raw = 100.0 * matched as f64 / required as f64;
    ((raw * 10.0).round() / 10.0).clamp(0.0, 100.0)
}
