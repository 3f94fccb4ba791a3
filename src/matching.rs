//! Approximate name matching between the reference page and the unit catalog.
//!
//! Scores are in `0.0..=1.0`. `weighted_ratio` blends whole-string, partial and
//! token-based similarities so that "Denali National Park" still lands on
//! "Denali".

use std::collections::BTreeSet;

/// Best candidate for a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    pub choice: &'a str,
    pub index: usize,
    pub score: f64,
}

/// Highest-scoring choice; the earliest one wins ties. `None` for no choices.
pub fn extract_one<'a>(query: &str, choices: &[&'a str]) -> Option<Match<'a>> {
    let mut best: Option<Match<'a>> = None;
    for (index, &choice) in choices.iter().enumerate() {
        let score = weighted_ratio(query, choice);
        if best.map_or(true, |b| score > b.score) {
            best = Some(Match {
                choice,
                index,
                score,
            });
        }
    }
    best
}

pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let p1 = full_process(a);
    let p2 = full_process(b);
    if p1.is_empty() || p2.is_empty() {
        return 0.0;
    }

    let base = ratio(&p1, &p2);
    let (len1, len2) = (p1.chars().count() as f64, p2.chars().count() as f64);
    let len_ratio = len1.max(len2) / len1.min(len2);

    const UNBASE_SCALE: f64 = 0.95;

    if len_ratio < 1.5 {
        let tsor = token_sort_ratio(&p1, &p2, false) * UNBASE_SCALE;
        let tser = token_set_ratio(&p1, &p2, false) * UNBASE_SCALE;
        return base.max(tsor).max(tser);
    }

    let partial_scale = if len_ratio <= 8.0 { 0.9 } else { 0.6 };
    let partial = partial_ratio(&p1, &p2) * partial_scale;
    let ptsor = token_sort_ratio(&p1, &p2, true) * UNBASE_SCALE * partial_scale;
    let ptser = token_set_ratio(&p1, &p2, true) * UNBASE_SCALE * partial_scale;
    base.max(partial).max(ptsor).max(ptser)
}

/// Lowercase, non-alphanumerics to spaces, single-spaced.
fn full_process(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Best `ratio` of the shorter string against each same-length window of the longer.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    let mut best = 0.0f64;
    for window in long_chars.windows(width) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best >= 1.0 {
            break;
        }
    }
    best
}

fn similarity(a: &str, b: &str, partial: bool) -> f64 {
    if partial {
        partial_ratio(a, b)
    } else {
        ratio(a, b)
    }
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_sort_ratio(a: &str, b: &str, partial: bool) -> f64 {
    similarity(&sorted_tokens(a), &sorted_tokens(b), partial)
}

fn token_set_ratio(a: &str, b: &str, partial: bool) -> f64 {
    let t1: BTreeSet<&str> = a.split_whitespace().collect();
    let t2: BTreeSet<&str> = b.split_whitespace().collect();

    let sect = t1.intersection(&t2).copied().collect::<Vec<_>>().join(" ");
    let diff_1to2 = t1.difference(&t2).copied().collect::<Vec<_>>().join(" ");
    let diff_2to1 = t2.difference(&t1).copied().collect::<Vec<_>>().join(" ");

    let combined_1to2 = format!("{} {}", sect, diff_1to2).trim().to_string();
    let combined_2to1 = format!("{} {}", sect, diff_2to1).trim().to_string();

    [
        similarity(&sect, &combined_1to2, partial),
        similarity(&sect, &combined_2to1, partial),
        similarity(&combined_1to2, &combined_2to1, partial),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_names_score_one() {
        assert_eq!(weighted_ratio("Acadia", "acadia"), 1.0);
    }

    #[test]
    fn test_suffix_words_still_match() {
        let m = extract_one("Denali National Park", &["Denali", "New River Gorge"]).unwrap();
        assert_eq!(m.choice, "Denali");
        assert_eq!(m.index, 0);
        assert!(m.score >= 0.85, "score {}", m.score);
    }

    #[test]
    fn test_token_order_does_not_matter() {
        let score = weighted_ratio("Gorge New River", "New River Gorge");
        assert!(score >= 0.94, "score {}", score);
    }

    #[test]
    fn test_punctuation_is_ignored() {
        let m = extract_one(
            "Hawai'i Volcanoes",
            &["Haleakala", "Hawaii Volcanoes", "Hot Springs"],
        )
        .unwrap();
        assert_eq!(m.choice, "Hawaii Volcanoes");
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(extract_one("Zion", &[]), None);
        assert_eq!(weighted_ratio("", "Zion"), 0.0);
        assert_eq!(weighted_ratio("***", "Zion"), 0.0);
    }

    #[test]
    fn test_partial_scale_drops_only_past_eight_times_the_length() {
        assert!((weighted_ratio("a", "abcdefgh") - 0.9).abs() < 1e-9);
        assert!((weighted_ratio("a", "abcdefghi") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first_choice() {
        let m = extract_one("Zion", &["Zion", "Zion"]).unwrap();
        assert_eq!(m.index, 0);
    }
}
