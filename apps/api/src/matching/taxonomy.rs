//! Taxonomy: canonical skill registry and flat alias table.
//!
//! A `Taxonomy` is a plain value: authored through `register` / `add_alias`,
//! then frozen behind an `Arc` and shared read-only by the extractor and
//! matcher. Serving-time mutation goes through `SharedTaxonomy::update`,
//! which publishes a fresh snapshot instead of touching the live one.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::matching::normalize::{normalize, word_count};

/// Longest alias (in words) the extractor's sliding window can see.
pub const MAX_ALIAS_WORDS: usize = 3;

/// Identifier of a canonical skill: a dense index into one taxonomy's
/// registry. Only meaningful together with the snapshot that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(u32);

impl SkillId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered skill. `name` is the normalized display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSkill {
    pub id: SkillId,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaxonomyError {
    #[error("alias '{alias}' is already bound to '{existing}', cannot rebind to '{requested}'")]
    Conflict {
        alias: String,
        existing: String,
        requested: String,
    },

    #[error("unknown skill id {0:?}")]
    UnknownSkill(SkillId),

    #[error("no canonical skill named '{0}'")]
    UnknownName(String),

    #[error("alias '{0}' is empty after normalization")]
    EmptyAlias(String),

    #[error("alias '{alias}' has {words} words, aliases are limited to 3")]
    AliasTooLong { alias: String, words: usize },
}

#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    version: u64,
    skills: Vec<CanonicalSkill>,
    aliases: HashMap<String, SkillId>,
    longest_alias: usize,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canonical skill, binding its own name as an alias.
    /// Idempotent on the normalized name; the category of the first
    /// registration wins.
    pub fn register(
        &mut self,
        name: &str,
        category: Option<&str>,
    ) -> Result<SkillId, TaxonomyError> {
        let key = checked_key(name)?;

        if let Some(&existing) = self.aliases.get(&key) {
            let skill = &self.skills[existing.index()];
            if skill.name == key {
                return Ok(existing);
            }
            return Err(TaxonomyError::Conflict {
                alias: key.clone(),
                existing: skill.name.clone(),
                requested: key,
            });
        }

        let id = SkillId(self.skills.len() as u32);
        self.longest_alias = self.longest_alias.max(word_count(&key));
        self.aliases.insert(key.clone(), id);
        self.skills.push(CanonicalSkill {
            id,
            name: key,
            category: category.map(str::to_string),
        });
        Ok(id)
    }

    /// Binds `surface` to `skill`. Rebinding to the same skill is a no-op;
    /// rebinding to a different skill is a `Conflict`.
    pub fn add_alias(&mut self, surface: &str, skill: SkillId) -> Result<(), TaxonomyError> {
        if skill.index() >= self.skills.len() {
            return Err(TaxonomyError::UnknownSkill(skill));
        }
        let key = checked_key(surface)?;

        match self.aliases.get(&key).copied() {
            Some(existing) if existing == skill => Ok(()),
            Some(existing) => Err(TaxonomyError::Conflict {
                alias: key,
                existing: self.skills[existing.index()].name.clone(),
                requested: self.skills[skill.index()].name.clone(),
            }),
            None => {
                self.longest_alias = self.longest_alias.max(word_count(&key));
                self.aliases.insert(key, skill);
                Ok(())
            }
        }
    }

    /// Resolves a raw surface form. Unknown forms yield `None`.
    pub fn resolve(&self, surface: &str) -> Option<SkillId> {
        self.resolve_normalized(&normalize(surface))
    }

    /// Lookup for a key that is already normalized (extractor hot path).
    pub fn resolve_normalized(&self, key: &str) -> Option<SkillId> {
        self.aliases.get(key).copied()
    }

    pub fn skill(&self, id: SkillId) -> Option<&CanonicalSkill> {
        self.skills.get(id.index())
    }

    pub fn display_name(&self, id: SkillId) -> &str {
        self.skill(id).map(|s| s.name.as_str()).unwrap_or("")
    }

    pub fn skills(&self) -> &[CanonicalSkill] {
        &self.skills
    }

    /// Aliases bound to `id`, sorted, excluding the skill's own name.
    pub fn aliases_of(&self, id: SkillId) -> Vec<String> {
        let own = self.display_name(id);
        let mut out: Vec<String> = self
            .aliases
            .iter()
            .filter(|(alias, &target)| target == id && alias.as_str() != own)
            .map(|(alias, _)| alias.clone())
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Word count of the longest alias, never above `MAX_ALIAS_WORDS`.
    pub fn longest_alias_words(&self) -> usize {
        self.longest_alias
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Loads a taxonomy from a JSON file (see `TaxonomyFile`).
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy file {}", path.display()))?;
        let file: TaxonomyFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid taxonomy JSON in {}", path.display()))?;
        let taxonomy = Self::from_file(&file)
            .with_context(|| format!("Taxonomy conflict in {}", path.display()))?;
        Ok(taxonomy)
    }

    /// Builds a taxonomy from a deserialized taxonomy file. Any conflict
    /// rejects the whole file.
    pub fn from_file(file: &TaxonomyFile) -> Result<Self, TaxonomyError> {
        let mut taxonomy = Self::new();
        for entry in &file.skills {
            let id = taxonomy.register(&entry.name, entry.category.as_deref())?;
            for alias in &entry.aliases {
                taxonomy.add_alias(alias, id)?;
            }
        }
        Ok(taxonomy)
    }
}

fn checked_key(surface: &str) -> Result<String, TaxonomyError> {
    let key = normalize(surface);
    if key.is_empty() {
        return Err(TaxonomyError::EmptyAlias(surface.to_string()));
    }
    let words = word_count(&key);
    if words > MAX_ALIAS_WORDS {
        return Err(TaxonomyError::AliasTooLong { alias: key, words });
    }
    Ok(key)
}

/// On-disk taxonomy format.
///
/// ```json
/// { "skills": [ { "name": "javascript", "category": "languages", "aliases": ["js"] } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyFile {
    pub skills: Vec<TaxonomyFileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyFileEntry {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared, snapshot-isolated handle
// ────────────────────────────────────────────────────────────────────────────

/// Read-mostly handle over the live taxonomy.
///
/// Readers pin an `Arc<Taxonomy>` for the whole request. Writers are
/// serialized and publish a complete copy, so a reader never observes a
/// half-applied update.
#[derive(Clone)]
pub struct SharedTaxonomy {
    inner: Arc<SharedInner>,
}

struct SharedInner {
    current: RwLock<Arc<Taxonomy>>,
    writer: Mutex<()>,
}

impl SharedTaxonomy {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                current: RwLock::new(Arc::new(taxonomy)),
                writer: Mutex::new(()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<Taxonomy> {
        self.inner
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Applies `edit` to a copy of the current taxonomy and publishes it
    /// under the next version. Nothing is published if `edit` fails.
    /// `edit` may also replace the copy wholesale (file reload); the
    /// version still only moves forward.
    pub fn update<T, F>(&self, edit: F) -> Result<(T, u64), TaxonomyError>
    where
        F: FnOnce(&mut Taxonomy) -> Result<T, TaxonomyError>,
    {
        let _writer = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current = self.snapshot();
        let mut next = (*current).clone();
        let value = edit(&mut next)?;
        let version = current.version + 1;
        next.version = version;

        *self
            .inner
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(next);

        info!("Published taxonomy snapshot v{version}");
        Ok((value, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Taxonomy, SkillId, SkillId) {
        let mut t = Taxonomy::new();
        let python = t.register("python", Some("languages")).unwrap();
        let js = t.register("javascript", Some("languages")).unwrap();
        t.add_alias("js", js).unwrap();
        (t, python, js)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut t = Taxonomy::new();
        let a = t.register("Python", None).unwrap();
        let b = t.register("  python ", Some("languages")).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
        assert_eq!(t.skill(a).unwrap().category, None);
    }

    #[test]
    fn test_resolve_case_and_whitespace_insensitive() {
        let (t, _, js) = sample();
        assert_eq!(t.resolve("JavaScript"), t.resolve(" javascript "));
        assert_eq!(t.resolve("JS"), Some(js));
        assert_eq!(t.resolve("JS."), Some(js));
    }

    #[test]
    fn test_unknown_surface_resolves_to_none() {
        let (t, _, _) = sample();
        assert_eq!(t.resolve("cobol"), None);
        assert_eq!(t.resolve(""), None);
    }

    #[test]
    fn test_alias_conflict_rejected_and_table_unchanged() {
        let (mut t, python, js) = sample();
        let before = t.alias_count();
        let err = t.add_alias("JS", python).unwrap_err();
        assert_eq!(
            err,
            TaxonomyError::Conflict {
                alias: "js".to_string(),
                existing: "javascript".to_string(),
                requested: "python".to_string(),
            }
        );
        assert_eq!(t.alias_count(), before);
        assert_eq!(t.resolve("js"), Some(js));
    }

    #[test]
    fn test_rebinding_same_skill_is_noop() {
        let (mut t, _, js) = sample();
        assert!(t.add_alias(" Js ", js).is_ok());
        assert_eq!(t.aliases_of(js), vec!["js".to_string()]);
    }

    #[test]
    fn test_register_name_taken_by_alias_conflicts() {
        let (mut t, _, _) = sample();
        assert!(matches!(
            t.register("js", None),
            Err(TaxonomyError::Conflict { .. })
        ));
    }

    #[test]
    fn test_empty_and_long_aliases_rejected() {
        let (mut t, python, _) = sample();
        assert!(matches!(
            t.add_alias("  ..  ", python),
            Err(TaxonomyError::EmptyAlias(_))
        ));
        assert!(matches!(
            t.add_alias("a very long python alias", python),
            Err(TaxonomyError::AliasTooLong { words: 5, .. })
        ));
    }

    #[test]
    fn test_unknown_skill_id_rejected() {
        let mut t = Taxonomy::new();
        let mut other = Taxonomy::new();
        let foreign = other.register("rust", None).unwrap();
        assert_eq!(
            t.add_alias("rs", foreign),
            Err(TaxonomyError::UnknownSkill(foreign))
        );
    }

    #[test]
    fn test_longest_alias_tracked() {
        let mut t = Taxonomy::new();
        let cpp = t.register("c++", None).unwrap();
        assert_eq!(t.longest_alias_words(), 1);
        t.add_alias("c plus plus", cpp).unwrap();
        assert_eq!(t.longest_alias_words(), 3);
    }

    #[test]
    fn test_from_file_builds_aliases() {
        let file: TaxonomyFile = serde_json::from_str(
            r#"{"skills": [
                {"name": "javascript", "category": "languages", "aliases": ["js", "ecmascript"]},
                {"name": "sql"}
            ]}"#,
        )
        .unwrap();
        let t = Taxonomy::from_file(&file).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.resolve("ECMAScript"), t.resolve("javascript"));
        assert!(t.resolve("sql").is_some());
    }

    #[test]
    fn test_from_file_conflict_rejected() {
        let file: TaxonomyFile = serde_json::from_str(
            r#"{"skills": [
                {"name": "go", "aliases": ["golang"]},
                {"name": "golang"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            Taxonomy::from_file(&file),
            Err(TaxonomyError::Conflict { .. })
        ));
    }

    #[test]
    fn test_from_json_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(&path, r#"{"skills": [{"name": "rust", "aliases": ["rustlang"]}]}"#)
            .unwrap();
        let t = Taxonomy::from_json_file(&path).unwrap();
        assert!(t.resolve("RustLang").is_some());
    }

    #[test]
    fn test_from_json_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Taxonomy::from_json_file(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_shared_update_publishes_new_snapshot() {
        let (t, python, _) = sample();
        let shared = SharedTaxonomy::new(t);
        let pinned = shared.snapshot();

        let (_, version) = shared
            .update(|t| t.add_alias("py", python))
            .unwrap();

        assert_eq!(version, 1);
        assert_eq!(pinned.version(), 0);
        assert_eq!(pinned.resolve("py"), None);
        assert_eq!(shared.snapshot().resolve("py"), Some(python));
    }

    #[test]
    fn test_shared_replace_keeps_version_monotonic() {
        let (t, _, _) = sample();
        let shared = SharedTaxonomy::new(t);
        shared.update(|t| t.register("rust", None)).unwrap();

        let mut fresh = Taxonomy::new();
        fresh.register("go", None).unwrap();
        let (_, version) = shared
            .update(move |t| {
                *t = fresh;
                Ok(())
            })
            .unwrap();

        assert_eq!(version, 2);
        let current = shared.snapshot();
        assert_eq!(current.version(), 2);
        assert!(current.resolve("go").is_some());
        assert!(current.resolve("python").is_none());
    }

    #[test]
    fn test_shared_failed_update_publishes_nothing() {
        let (t, python, _) = sample();
        let shared = SharedTaxonomy::new(t);

        let result = shared.update(|t| {
            t.add_alias("py", python)?;
            t.add_alias("js", python)
        });

        assert!(result.is_err());
        let current = shared.snapshot();
        assert_eq!(current.version(), 0);
        assert_eq!(current.resolve("py"), None);
    }
}
