//! Match engine: runs one request through extraction, matching and assembly.
//!
//! Every request pins a single taxonomy snapshot, so both documents are
//! extracted and the result is named against the same vocabulary even if a
//! reload publishes mid-request.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::matching::assembler::{assemble, MatchResponse};
use crate::matching::cache::{CacheStats, DocumentKey, ExtractionCache};
use crate::matching::extractor::{ExtractError, SkillExtractor, SkillSet};
use crate::matching::matcher::{Matcher, EMPTY_REQUIREMENTS_SCORE};
use crate::matching::taxonomy::{SharedTaxonomy, SkillId, Taxonomy, TaxonomyError};
use crate::models::document::{JobPosting, ResumeDocument};

/// How a job states what it needs.
#[derive(Debug, Clone, Copy)]
pub enum JobRequirements<'a> {
    /// Free-text description, run through the extractor.
    Text(&'a str),
    /// Explicit list of skill names, resolved one by one.
    Listed(&'a [String]),
}

#[derive(Debug, Clone, Serialize)]
pub struct VocabularyEntry {
    pub name: String,
    pub category: Option<String>,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Vocabulary {
    pub version: u64,
    pub skills: Vec<VocabularyEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Per-text extraction limit, in bytes.
    pub max_text_bytes: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_text_bytes: 200_000,
        }
    }
}

pub struct MatchEngine {
    taxonomy: SharedTaxonomy,
    cache: ExtractionCache,
    settings: EngineSettings,
}

impl MatchEngine {
    pub fn new(taxonomy: SharedTaxonomy, cache: ExtractionCache, settings: EngineSettings) -> Self {
        Self {
            taxonomy,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    fn extractor(&self, snapshot: &Arc<Taxonomy>) -> SkillExtractor {
        SkillExtractor::new(snapshot.clone(), self.settings.max_text_bytes)
    }

    /// Matches ad-hoc texts (nothing cached: there is no document id).
    pub fn match_texts(
        &self,
        resume_text: &str,
        job: JobRequirements<'_>,
        job_title: Option<String>,
        resume_title: Option<String>,
    ) -> Result<MatchResponse, ExtractError> {
        let snapshot = self.taxonomy.snapshot();
        let extractor = self.extractor(&snapshot);

        let resume_skills = extractor.extract(resume_text)?;
        let job_skills = match job {
            JobRequirements::Text(text) => extractor.extract(text)?,
            JobRequirements::Listed(names) => extractor.extract_listed(names)?,
        };

        Ok(self.finish(&snapshot, &resume_skills, &job_skills, job_title, resume_title))
    }

    /// Matches stored documents, reusing cached skill sets where valid.
    pub fn match_documents(
        &self,
        resume: &ResumeDocument,
        job: &JobPosting,
    ) -> Result<MatchResponse, ExtractError> {
        let snapshot = self.taxonomy.snapshot();
        let extractor = self.extractor(&snapshot);

        let resume_skills = self.cached_extract(
            &extractor,
            DocumentKey::Resume(resume.resume_id),
            &resume.resume_text,
        )?;
        let job_skills =
            self.cached_extract(&extractor, DocumentKey::Job(job.job_id), &job.description)?;

        Ok(self.finish(
            &snapshot,
            &resume_skills,
            &job_skills,
            Some(job.title.clone()),
            Some(resume.title()),
        ))
    }

    /// Sorted display names of the skills found in `text`.
    pub fn extract_preview(&self, text: &str) -> Result<Vec<String>, ExtractError> {
        let snapshot = self.taxonomy.snapshot();
        let skills = self.extractor(&snapshot).extract(text)?;
        Ok(skills.display_names(&snapshot))
    }

    /// Publishes `next` as the live taxonomy and drops all cached sets.
    /// Skill ids of the new taxonomy are unrelated to the previous ones.
    pub fn replace_taxonomy(&self, next: Taxonomy) -> Result<u64, TaxonomyError> {
        let (_, version) = self.taxonomy.update(move |t| {
            *t = next;
            Ok(())
        })?;
        self.cache.invalidate_all();
        info!("Taxonomy replaced, now v{version}; extraction cache cleared");
        Ok(version)
    }

    // Not routed: the HTTP surface never mutates the taxonomy.
    /// Registers a canonical skill in a new snapshot. Existing ids are kept;
    /// a new skill gets the next id.
    #[allow(dead_code)]
    pub fn register_skill(
        &self,
        name: &str,
        category: Option<&str>,
    ) -> Result<(SkillId, u64), TaxonomyError> {
        let (id, version) = self.taxonomy.update(|t| t.register(name, category))?;
        self.cache.invalidate_all();
        info!("Registered skill '{name}' in taxonomy v{version}");
        Ok((id, version))
    }

    /// Binds `surface` to the canonical skill named `canonical` in a new
    /// snapshot. On any error the live taxonomy is left untouched.
    #[allow(dead_code)]
    pub fn add_alias(&self, surface: &str, canonical: &str) -> Result<u64, TaxonomyError> {
        let (_, version) = self.taxonomy.update(|t| {
            let id = t
                .resolve(canonical)
                .ok_or_else(|| TaxonomyError::UnknownName(canonical.to_string()))?;
            t.add_alias(surface, id)
        })?;
        self.cache.invalidate_all();
        info!("Added alias '{surface}' -> '{canonical}' in taxonomy v{version}");
        Ok(version)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        let snapshot = self.taxonomy.snapshot();
        let mut skills: Vec<VocabularyEntry> = snapshot
            .skills()
            .iter()
            .map(|skill| VocabularyEntry {
                name: skill.name.clone(),
                category: skill.category.clone(),
                aliases: snapshot.aliases_of(skill.id),
            })
            .collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        Vocabulary {
            version: snapshot.version(),
            skills,
        }
    }

    pub fn vocabulary_version(&self) -> u64 {
        self.taxonomy.snapshot().version()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn cached_extract(
        &self,
        extractor: &SkillExtractor,
        key: DocumentKey,
        text: &str,
    ) -> Result<Arc<SkillSet>, ExtractError> {
        let version = extractor.taxonomy().version();
        if let Some(hit) = self.cache.get(key, text, version) {
            debug!("Extraction cache hit for {key:?}");
            return Ok(hit);
        }
        let skills = Arc::new(extractor.extract(text)?);
        self.cache.insert(key, text, version, skills.clone());
        Ok(skills)
    }

    fn finish(
        &self,
        snapshot: &Arc<Taxonomy>,
        resume_skills: &SkillSet,
        job_skills: &SkillSet,
        job_title: Option<String>,
        resume_title: Option<String>,
    ) -> MatchResponse {
        if job_skills.is_empty() {
            debug!("Job names no known skills; scoring {EMPTY_REQUIREMENTS_SCORE}");
        }
        let result = Matcher::new(snapshot.clone()).compare(resume_skills, job_skills);
        debug!(
            "Matched {}/{} job skills (score {})",
            result.matched.len(),
            job_skills.len(),
            result.score
        );
        assemble(result, job_title, resume_title)
    }
}
