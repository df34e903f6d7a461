//! Keyword extraction and matching between meal titles and recipe URL paths.

use super::policy::LinkPolicy;
use crate::text::normalize_label;
use std::collections::HashSet;

/// Splits a title (or a decoded URL path) into normalized keywords, dropping
/// stop words and anything shorter than three characters.
pub fn extract_recipe_keywords(policy: &LinkPolicy, value: &str) -> Vec<String> {
    normalize_label(value)
        .split(' ')
        .filter(|word| word.len() > 2 && !policy.stop_words.contains(*word))
        .map(str::to_string)
        .collect()
}

/// True when enough expected keywords appear in the candidate: all of them
/// for one or two expected words, otherwise at least half rounded up with a
/// floor of two.
pub fn has_sufficient_keyword_overlap(expected: &[String], candidate: &[String]) -> bool {
    if expected.is_empty() {
        return true;
    }
    if candidate.is_empty() {
        return false;
    }
    let candidate_set: HashSet<&str> = candidate.iter().map(String::as_str).collect();
    let matches = expected
        .iter()
        .filter(|word| candidate_set.contains(word.as_str()))
        .count();
    match expected.len() {
        1 => matches == 1,
        2 => matches >= 2,
        n => matches >= n.min(2.max(n.div_ceil(2))),
    }
}

/// Checks one expected keyword against a candidate set through the synonym
/// table; a word without synonyms must match itself.
pub fn keyword_matches(policy: &LinkPolicy, word: &str, candidate_set: &HashSet<&str>) -> bool {
    match policy.synonyms.get(word) {
        Some(synonyms) => synonyms.iter().any(|syn| candidate_set.contains(syn.as_str())),
        None => candidate_set.contains(word),
    }
}

/// True when every expected keyword is either in the optional/descriptive
/// set or covered by the candidate via synonyms. This is what rejects a
/// "boeuf" URL offered for a "cochon" dish.
pub fn has_essential_keyword_coverage(
    policy: &LinkPolicy,
    expected: &[String],
    candidate: &[String],
) -> bool {
    if expected.is_empty() {
        return true;
    }
    if candidate.is_empty() {
        return false;
    }
    let candidate_set: HashSet<&str> = candidate.iter().map(String::as_str).collect();
    expected.iter().all(|word| {
        policy.optional_keywords.contains(word) || keyword_matches(policy, word, &candidate_set)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn extracts_keywords_without_stop_words_or_diacritics() {
        let policy = LinkPolicy::default();
        assert_eq!(
            extract_recipe_keywords(&policy, "Sauté de cochon aux pommes de terre"),
            words(&["saute", "cochon", "pommes", "terre"])
        );
        assert_eq!(
            extract_recipe_keywords(&policy, "Recette facile: plat rapide"),
            Vec::<String>::new()
        );
        assert_eq!(extract_recipe_keywords(&policy, ""), Vec::<String>::new());
    }

    #[test]
    fn overlap_needs_everything_for_short_titles() {
        let exp = words(&["tarte", "pommes"]);
        assert!(has_sufficient_keyword_overlap(&exp, &words(&["tarte", "pommes", "maison"])));
        assert!(!has_sufficient_keyword_overlap(&exp, &words(&["tarte", "citron"])));
    }

    #[test]
    fn overlap_needs_half_for_long_titles() {
        let exp = words(&["saute", "cochon", "pommes", "terre"]);
        assert!(has_sufficient_keyword_overlap(&exp, &words(&["cochon", "pommes"])));
        assert!(!has_sufficient_keyword_overlap(&exp, &words(&["cochon"])));
        assert!(!has_sufficient_keyword_overlap(&exp, &[]));
        assert!(has_sufficient_keyword_overlap(&[], &words(&["anything"])));
    }

    #[test]
    fn essential_coverage_accepts_synonyms() {
        let policy = LinkPolicy::default();
        assert!(has_essential_keyword_coverage(
            &policy,
            &words(&["cochon", "pommes", "terre"]),
            &words(&["porc", "pommes", "terre"]),
        ));
        assert!(!has_essential_keyword_coverage(
            &policy,
            &words(&["cochon", "pommes", "terre"]),
            &words(&["boeuf", "pommes"]),
        ));
    }

    #[test]
    fn essential_coverage_skips_optional_words() {
        let policy = LinkPolicy::default();
        // "saute" is descriptive and may be missing from the URL path.
        assert!(has_essential_keyword_coverage(
            &policy,
            &words(&["saute", "cochon", "terre"]),
            &words(&["cochon", "terre"]),
        ));
    }
}
