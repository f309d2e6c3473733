//! Surface-form normalization shared by alias authoring and extraction.
//!
//! Both sides MUST go through `normalize` / `normalize_word` so that a form
//! registered as an alias and the same form found in free text produce the
//! same lookup key.

/// Punctuation trimmed from both ends of every word.
const EDGE_PUNCTUATION: &[char] = &[
    ',', ';', ':', '!', '?', '"', '\'', '(', ')', '[', ']', '{', '}', '<', '>', '*', '`',
];

/// Normalizes a single word: lowercase, edge punctuation trimmed, trailing
/// full stops dropped. Internal punctuation (`node.js`, `ci/cd`) and the
/// `+`/`#` suffixes of `c++`/`c#` survive. May return an empty string.
pub fn normalize_word(word: &str) -> String {
    let lowered = word.to_lowercase();
    let mut trimmed = lowered.as_str();
    loop {
        let next = trimmed
            .trim_matches(EDGE_PUNCTUATION)
            .trim_end_matches('.');
        if next.len() == trimmed.len() {
            break;
        }
        trimmed = next;
    }
    trimmed.to_string()
}

/// Normalizes a whole surface form: case-fold, trim, collapse internal
/// whitespace, strip common punctuation word by word.
pub fn normalize(surface: &str) -> String {
    surface
        .split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of words in an already-normalized form.
pub fn word_count(normalized: &str) -> usize {
    normalized.split(' ').filter(|w| !w.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace_folded() {
        assert_eq!(normalize("  Machine   LEARNING "), "machine learning");
        assert_eq!(normalize("JavaScript"), normalize(" javascript "));
    }

    #[test]
    fn test_trailing_sentence_punctuation_stripped() {
        assert_eq!(normalize("JS."), "js");
        assert_eq!(normalize("(Python),"), "python");
        assert_eq!(normalize("\"Docker\"!"), "docker");
    }

    #[test]
    fn test_internal_punctuation_preserved() {
        assert_eq!(normalize("Node.js"), "node.js");
        assert_eq!(normalize("CI/CD"), "ci/cd");
        assert_eq!(normalize("scikit-learn"), "scikit-learn");
    }

    #[test]
    fn test_language_suffixes_preserved() {
        assert_eq!(normalize("C++"), "c++");
        assert_eq!(normalize("C#,"), "c#");
        assert_eq!(normalize(".NET"), ".net");
    }

    #[test]
    fn test_punctuation_only_is_empty() {
        assert_eq!(normalize("  ... ,, "), "");
        assert_eq!(normalize_word("()"), "");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("c plus plus"), 3);
        assert_eq!(word_count("rust"), 1);
        assert_eq!(word_count(""), 0);
    }
}
