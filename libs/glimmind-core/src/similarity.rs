//! Fuzzy answer scoring for written mode.
//!
//! Both strings are normalized (lowercased, trimmed, accents and punctuation
//! stripped) and compared with Levenshtein distance relative to the longer one.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Result of grading a typed answer against the expected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the score reached the threshold.
    pub is_correct: bool,
    /// Similarity score between 0.0 and 1.0.
    pub similarity: f64,
    /// Normalized typed answer (for display).
    pub typed_normalized: String,
    /// Normalized correct answer (for display).
    pub correct_normalized: String,
}

/// Grade a typed answer against the correct one.
pub fn compare_answers(typed: &str, correct: &str, threshold: f64) -> MatchResult {
    let typed_normalized = normalize(typed);
    let correct_normalized = normalize(correct);
    let similarity = normalized_score(&typed_normalized, &correct_normalized);

    MatchResult {
        is_correct: similarity >= threshold,
        similarity,
        typed_normalized,
        correct_normalized,
    }
}

/// Similarity between two raw strings, in [0, 1].
pub fn score(input: &str, target: &str) -> f64 {
    normalized_score(&normalize(input), &normalize(target))
}

/// Lowercase, trim, decompose to NFD, then drop combining marks and anything
/// that is neither a word character nor whitespace.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

fn normalized_score(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }

    let max_len = a_len.max(b_len);
    let distance = levenshtein_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Calculate Levenshtein distance between two strings, counted in chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rows are enough for the recurrence
    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };

            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
