//! Naming drift: how far a file name is from what the file contains

use std::collections::HashMap;

use super::concepts::split_identifier;
use super::models::{Concept, GENERIC_FILENAMES};
use crate::math::stats::cosine_similarity;
use crate::scanning::models::file_stem;

fn term_counts<'a>(tokens: impl IntoIterator<Item = &'a str>) -> HashMap<String, f64> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    counts
}

/// `1 - cosine(file name tokens, concept keywords)`.
///
/// 0.0 for generic names (`utils`, `index`, ...) and below tier 3, where
/// there is too little vocabulary to compare against.
pub fn naming_drift(path: &str, concepts: &[Concept], tier: u8) -> f64 {
    let stem = file_stem(path).to_lowercase();
    if GENERIC_FILENAMES.contains(&stem.as_str()) || tier < 3 {
        return 0.0;
    }

    let name_tokens = split_identifier(&stem);
    let keywords: Vec<&str> = concepts
        .iter()
        .flat_map(|c| c.keywords.iter().map(String::as_str))
        .collect();
    if name_tokens.is_empty() || keywords.is_empty() {
        return 0.0;
    }

    let similarity = cosine_similarity(
        &term_counts(name_tokens.iter().map(String::as_str)),
        &term_counts(keywords),
    );
    1.0 - similarity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(keywords: &[&str]) -> Concept {
        Concept {
            topic: keywords[0].to_string(),
            weight: 1.0,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_unrelated_name_drifts_fully() {
        let drift = naming_drift("app/payment.py", &[concept(&["email", "smtp"])], 3);
        assert!((drift - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_matching_name_has_low_drift() {
        let drift = naming_drift("app/email_sender.py", &[concept(&["email", "sender"])], 3);
        assert!(drift < 1e-9);
    }

    #[test]
    fn test_generic_names_and_low_tiers_never_drift() {
        assert_eq!(naming_drift("app/utils.py", &[concept(&["email"])], 3), 0.0);
        assert_eq!(naming_drift("app/payment.py", &[concept(&["email"])], 2), 0.0);
    }
}
