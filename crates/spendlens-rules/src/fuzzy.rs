//! Token-set similarity for fuzzy phrase candidates.

use std::collections::BTreeSet;

/// Similarity at or above which a fuzzy candidate counts as present.
pub const FUZZY_THRESHOLD: f32 = 0.85;

/// Normalized token-set overlap ratio in [0,1].
///
/// Both sides are whitespace-split into lowercase token sets. If either set
/// is contained in the other the ratio is 1.0 — a short candidate phrase
/// fully present in a longer notification is a full match. Otherwise the
/// ratio is `|intersection| / max(|a|, |b|)`.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let ta: BTreeSet<String> = a.split_whitespace().map(str::to_lowercase).collect();
    let tb: BTreeSet<String> = b.split_whitespace().map(str::to_lowercase).collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let inter = ta.intersection(&tb).count();
    if inter == ta.len() || inter == tb.len() {
        return 1.0;
    }
    inter as f32 / ta.len().max(tb.len()) as f32
}

/// Best-scoring candidate at or above `threshold`, if any.
///
/// All candidates are scored; only the best one is reported, so a category's
/// fuzzy weight is contributed at most once per evaluation.
pub fn fuzzy_best<'a>(
    text: &str,
    candidates: &'a [String],
    threshold: f32,
) -> Option<(&'a str, f32)> {
    let mut best: Option<(&str, f32)> = None;
    for candidate in candidates {
        let score = token_set_ratio(text, candidate);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.filter(|&(_, score)| score >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_is_full_match() {
        assert_eq!(token_set_ratio("petrol bunk", "500 petrol bunk payment"), 1.0);
        assert_eq!(token_set_ratio("500 petrol bunk payment", "petrol bunk"), 1.0);
    }

    #[test]
    fn partial_overlap() {
        // {fuel, pump} vs {fuel, station}: 1 common of max 2.
        assert_eq!(token_set_ratio("fuel pump", "fuel station"), 0.5);
    }

    #[test]
    fn disjoint_and_empty() {
        assert_eq!(token_set_ratio("uber trip", "electricity bill"), 0.0);
        assert_eq!(token_set_ratio("", "anything"), 0.0);
        assert_eq!(token_set_ratio("anything", ""), 0.0);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(token_set_ratio("Petrol Bunk", "petrol bunk refill"), 1.0);
    }

    #[test]
    fn best_candidate_wins() {
        let candidates = vec!["fuel station".to_string(), "petrol bunk".to_string()];
        let hit = fuzzy_best("went to the petrol bunk", &candidates, FUZZY_THRESHOLD);
        assert_eq!(hit, Some(("petrol bunk", 1.0)));
    }

    #[test]
    fn below_threshold_is_none() {
        let candidates = vec!["fuel station".to_string()];
        assert_eq!(fuzzy_best("fuel pump refill today", &candidates, FUZZY_THRESHOLD), None);
    }

    #[test]
    fn no_candidates_is_none() {
        assert_eq!(fuzzy_best("anything", &[], FUZZY_THRESHOLD), None);
    }
}
