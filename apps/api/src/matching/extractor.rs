//! Skill Extractor: turns raw document text into a `SkillSet`.
//!
//! Vocabulary-driven, not a language model: every hit is an exact alias
//! lookup, so the same text against the same taxonomy snapshot always
//! yields the same set.
//!
//! Algorithm:
//! 1. Split the text into clause segments at punctuation so a window never
//!    spans two sentences or list items.
//! 2. Normalize every word of a segment.
//! 3. Slide windows of 1..=N words (N = longest alias, capped at 3) and
//!    resolve each window against the taxonomy.
//! 4. A word that does not resolve whole loses a possessive `'s`, then a
//!    `-` or `/` joined word is retried part by part.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::matching::normalize::{normalize_word, word_count};
use crate::matching::taxonomy::{SkillId, Taxonomy, MAX_ALIAS_WORDS};

/// Characters that always end a clause segment.
const SEGMENT_BREAKS: &[char] = &[
    ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '|', '\n', '\r', '\u{2022}',
];

/// Joiners a word is split on when it does not resolve whole.
const COMPOUND_JOINERS: &[char] = &['-', '/'];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("input is {len} bytes, the limit is {max} bytes")]
    InputTooLarge { len: usize, max: usize },
}

/// Set of canonical skills found in one document. Iterates in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet {
    skills: BTreeSet<SkillId>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the skill was already present.
    pub fn insert(&mut self, id: SkillId) -> bool {
        self.skills.insert(id)
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.skills.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.skills.iter().copied()
    }

    /// Display names sorted lexicographically.
    pub fn display_names(&self, taxonomy: &Taxonomy) -> Vec<String> {
        sorted_names(self.iter(), taxonomy)
    }
}

impl FromIterator<SkillId> for SkillSet {
    fn from_iter<I: IntoIterator<Item = SkillId>>(iter: I) -> Self {
        Self {
            skills: iter.into_iter().collect(),
        }
    }
}

/// Maps ids to display names and sorts them; shared with the matcher so
/// every list the service emits is ordered the same way.
pub fn sorted_names(ids: impl Iterator<Item = SkillId>, taxonomy: &Taxonomy) -> Vec<String> {
    let mut names: Vec<String> = ids
        .map(|id| taxonomy.display_name(id).to_string())
        .collect();
    names.sort();
    names
}

pub struct SkillExtractor {
    taxonomy: Arc<Taxonomy>,
    max_text_bytes: usize,
}

impl SkillExtractor {
    pub fn new(taxonomy: Arc<Taxonomy>, max_text_bytes: usize) -> Self {
        Self {
            taxonomy,
            max_text_bytes,
        }
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }

    /// Extracts every canonical skill mentioned in `text`.
    /// Oversized input is rejected outright, never truncated.
    pub fn extract(&self, text: &str) -> Result<SkillSet, ExtractError> {
        self.check_size(text.len())?;

        let window = self
            .taxonomy
            .longest_alias_words()
            .clamp(1, MAX_ALIAS_WORDS);
        let mut found = SkillSet::new();

        for segment in segments(text) {
            let words: Vec<String> = segment
                .split_whitespace()
                .map(normalize_word)
                .filter(|w| !w.is_empty())
                .collect();
            self.scan_words(&words, window, &mut found);
        }

        debug!(
            "Extracted {} skills from {} bytes (taxonomy v{})",
            found.len(),
            text.len(),
            self.taxonomy.version()
        );
        Ok(found)
    }

    /// Resolves an explicit requirement list (one skill name per item).
    /// Unknown names are dropped, like unknown words in free text.
    pub fn extract_listed(&self, names: &[String]) -> Result<SkillSet, ExtractError> {
        let total: usize = names.iter().map(String::len).sum();
        self.check_size(total)?;

        Ok(names
            .iter()
            .filter_map(|name| self.taxonomy.resolve(name))
            .collect())
    }

    fn check_size(&self, len: usize) -> Result<(), ExtractError> {
        if len > self.max_text_bytes {
            return Err(ExtractError::InputTooLarge {
                len,
                max: self.max_text_bytes,
            });
        }
        Ok(())
    }

    fn scan_words(&self, words: &[String], window: usize, found: &mut SkillSet) {
        for start in 0..words.len() {
            let longest = window.min(words.len() - start);
            for len in 1..=longest {
                let candidate = words[start..start + len].join(" ");
                if let Some(id) = self.taxonomy.resolve_normalized(&candidate) {
                    found.insert(id);
                } else if len == 1 {
                    self.scan_compound(&candidate, found);
                }
            }
        }
    }

    /// Fallback for a single word that is not an alias as written. Drops a
    /// possessive `'s`, then resolves the pieces of `-` or `/` joined words
    /// (`python-based`, `docker-compose`, `python/django`).
    fn scan_compound(&self, word: &str, found: &mut SkillSet) {
        let stem = strip_possessive(word);
        if stem.len() != word.len() {
            if let Some(id) = self.taxonomy.resolve_normalized(stem) {
                found.insert(id);
                return;
            }
        }
        if !stem.contains(COMPOUND_JOINERS) {
            return;
        }
        for part in stem.split(COMPOUND_JOINERS) {
            let part = normalize_word(part);
            if let Some(id) = self.taxonomy.resolve_normalized(strip_possessive(&part)) {
                found.insert(id);
            }
        }
    }
}

fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .unwrap_or(word)
}

/// Splits text into clause segments. A `.` only breaks when followed by
/// whitespace or the end of text, so `node.js` and `vue.js` stay whole.
fn segments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let breaks = if ch == '.' {
            chars.peek().map_or(true, |&(_, next)| next.is_whitespace())
        } else {
            SEGMENT_BREAKS.contains(&ch)
        };
        if breaks {
            push_segment(&mut out, &text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    push_segment(&mut out, &text[start..]);
    out
}

fn push_segment<'a>(out: &mut Vec<&'a str>, segment: &'a str) {
    if word_count(segment.trim()) > 0 {
        out.push(segment);
    }
}
