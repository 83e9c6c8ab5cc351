//! Concept extraction from review text
//!
//! Turns any text blob (diff, result, filenames, commit message) into a
//! deterministic set of typed concept labels. Extraction is a pure
//! function of the input and the static rule tables below: identical
//! input always yields identical output, and empty input yields the
//! empty set.

use crate::types::{ConceptId, ConceptType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Upper bound on `file:` concepts emitted per extraction, to keep the
/// pairwise learning cost bounded on very large diffs.
const MAX_FILE_CONCEPTS: usize = 20;

/// Ordered category table. Every category whose pattern matches anywhere
/// in the lowercased input emits `pattern:<category>`; matches are a set
/// union, so table order never affects the result.
static CATEGORY_TABLE: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "authentication",
            r"\b(auth|authentication|authorize|login|logout|jwt|oauth|token|session|password|credential)\b",
        ),
        (
            "security",
            r"\b(security|xss|csrf|injection|sanitize[sd]?|escape[sd]?|vulnerab\w+|exploit|secret|encrypt\w*)\b",
        ),
        (
            "database",
            r"\b(database|sql|migration|schema|postgres|sqlite|mysql|transaction|rollback)\b",
        ),
        (
            "api",
            r"\b(api|endpoint|rest|graphql|http|request|response|route|handler|webhook)\b",
        ),
        (
            "validation",
            r"\b(validat\w+|invalid|malformed|input check|constraint)\b",
        ),
        (
            "error",
            r"\b(error|exception|panic|crash|failure|stack trace|traceback)\b",
        ),
        (
            "testing",
            r"\b(test|tests|testing|spec|mock|fixture|assert\w*|coverage)\b",
        ),
        (
            "performance",
            r"\b(performance|latency|slow|optimiz\w+|cache|caching|memory leak|benchmark)\b",
        ),
        (
            "concurrency",
            r"\b(race condition|deadlock|mutex|lock|thread|async|await|concurren\w+)\b",
        ),
        (
            "logging",
            r"\b(log|logs|logging|logger|tracing|telemetry)\b",
        ),
        (
            "configuration",
            r"\b(config|configuration|environment variable|env var|settings|feature flag)\b",
        ),
        (
            "dependency",
            r"\b(dependency|dependencies|package|lockfile|version bump|upgrade)\b",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("static category pattern")))
    .collect()
});

/// Filename-like tokens carrying a recognized source extension.
static FILE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([a-z0-9_\-]+\.(?:rs|ts|tsx|js|jsx|py|go|java|rb|c|h|cpp|hpp|cs|swift|kt|php|sql|sh|vue|svelte|yml|yaml|toml|json))\b",
    )
    .expect("static file pattern")
});

/// Specialized error signatures worth their own concept.
static ERROR_SIGNATURES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (
            "null-reference",
            r"cannot read propert\w+ of (?:undefined|null)|undefined is not|null pointer|nullpointerexception|nullreferenceexception|\bnil\b.*dereference",
        ),
        (
            "type-mismatch",
            r"typeerror|type error|type mismatch|mismatched types|incompatible types?",
        ),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("static error pattern")))
    .collect()
});

/// Extract the deduplicated concept set from a text blob.
///
/// Emits `pattern:` concepts from the category table, bounded `file:`
/// concepts for filename-like tokens, and `error:` concepts for
/// recognizable error signatures.
pub fn extract_concepts(text: &str) -> BTreeSet<ConceptId> {
    let mut concepts = BTreeSet::new();
    if text.trim().is_empty() {
        return concepts;
    }

    let lowered = text.to_lowercase();

    for (category, pattern) in CATEGORY_TABLE.iter() {
        if pattern.is_match(&lowered) {
            concepts.insert(ConceptId::new(ConceptType::Pattern, category));
        }
    }

    let mut file_count = 0;
    for capture in FILE_TOKEN.captures_iter(&lowered) {
        if file_count >= MAX_FILE_CONCEPTS {
            break;
        }
        let name = &capture[1];
        if concepts.insert(ConceptId::new(ConceptType::File, name)) {
            file_count += 1;
        }
    }

    for (kind, pattern) in ERROR_SIGNATURES.iter() {
        if pattern.is_match(&lowered) {
            concepts.insert(ConceptId::new(ConceptType::Error, kind));
        }
    }

    concepts
}

/// The category labels (only) matching a text blob, for query building in
/// the retrieval pipeline. Same table, same matching rules as
/// [`extract_concepts`].
pub fn category_labels(text: &str) -> Vec<&'static str> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&lowered))
        .map(|(name, _)| *name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_keywords() {
        let concepts = extract_concepts("login jwt token");
        assert!(concepts.contains(&ConceptId::new(ConceptType::Pattern, "authentication")));
    }

    #[test]
    fn test_empty_input_yields_empty_set() {
        assert!(extract_concepts("").is_empty());
        assert!(extract_concepts("   \n\t").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "fix sql injection in user login handler of api.ts";
        assert_eq!(extract_concepts(text), extract_concepts(text));
    }

    #[test]
    fn test_multiple_categories_union() {
        let concepts = extract_concepts("SQL injection through the login endpoint");
        assert!(concepts.contains(&ConceptId::new(ConceptType::Pattern, "security")));
        assert!(concepts.contains(&ConceptId::new(ConceptType::Pattern, "database")));
        assert!(concepts.contains(&ConceptId::new(ConceptType::Pattern, "authentication")));
        assert!(concepts.contains(&ConceptId::new(ConceptType::Pattern, "api")));
    }

    #[test]
    fn test_case_insensitive() {
        let upper = extract_concepts("LOGIN JWT TOKEN");
        let lower = extract_concepts("login jwt token");
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_file_concepts() {
        let concepts = extract_concepts("changed src/login.ts and auth_middleware.py");
        assert!(concepts.contains(&ConceptId::new(ConceptType::File, "login.ts")));
        assert!(concepts.contains(&ConceptId::new(ConceptType::File, "auth_middleware.py")));
    }

    #[test]
    fn test_file_concepts_bounded() {
        let mut text = String::new();
        for i in 0..100 {
            text.push_str(&format!("module_{}.rs ", i));
        }
        let file_count = extract_concepts(&text)
            .iter()
            .filter(|c| c.concept_type() == Some(ConceptType::File))
            .count();
        assert!(file_count <= MAX_FILE_CONCEPTS);
    }

    #[test]
    fn test_error_signatures() {
        let concepts =
            extract_concepts("TypeError: cannot read properties of undefined (reading 'id')");
        assert!(concepts.contains(&ConceptId::new(ConceptType::Error, "null-reference")));
        assert!(concepts.contains(&ConceptId::new(ConceptType::Error, "type-mismatch")));
    }

    #[test]
    fn test_category_labels_subset() {
        let labels = category_labels("slow query causing latency in the cache layer");
        assert!(labels.contains(&"performance"));
    }
}
