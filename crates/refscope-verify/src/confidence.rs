//! Scoring of database candidates against an extracted reference.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use refscope_core::Reference;

use crate::VerificationStatus;
use crate::sources::Candidate;

/// Candidates scoring below this are discarded entirely.
pub const MIN_CANDIDATE_CONFIDENCE: f64 = 0.3;
pub const VERIFIED_CONFIDENCE: f64 = 0.85;
pub const AMBIGUOUS_CONFIDENCE: f64 = 0.5;
const YEAR_BONUS: f64 = 0.05;

/// Lowercase, strip diacritics and punctuation, then sort the words.
fn token_sorted(title: &str) -> String {
    static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

    let folded: String = title
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let spaced = NON_WORD.replace_all(&folded, " ");
    let mut tokens: Vec<&str> = spaced.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Word-order-insensitive title similarity in `[0, 1]`.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = token_sorted(a);
    let b = token_sorted(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars())
}

/// How well `candidate` matches `reference`.
///
/// An exact DOI match is conclusive. Otherwise the title similarity decides,
/// with a small bonus for a matching year.
pub fn candidate_confidence(reference: &Reference, candidate: &Candidate) -> f64 {
    if let (Some(ours), Some(theirs)) = (&reference.doi, &candidate.doi) {
        if ours.trim().eq_ignore_ascii_case(theirs.trim()) {
            return 1.0;
        }
    }

    if candidate.title.trim().is_empty() {
        return 0.0;
    }
    let title_score = title_similarity(&reference.title, &candidate.title);
    let year_bonus = match (reference.year, candidate.year) {
        (Some(a), Some(b)) if a == b => YEAR_BONUS,
        _ => 0.0,
    };
    (title_score + year_bonus).min(1.0)
}

/// Map a confidence to a status.
pub fn status_for(confidence: f64) -> VerificationStatus {
    if confidence >= VERIFIED_CONFIDENCE {
        VerificationStatus::Verified
    } else if confidence >= AMBIGUOUS_CONFIDENCE {
        VerificationStatus::Ambiguous
    } else {
        VerificationStatus::NotFound
    }
}

/// Round to three decimals for reporting.
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 1000.0
}

/// The highest-scoring candidate, or `None` if nothing clears
/// [`MIN_CANDIDATE_CONFIDENCE`]. Ties keep the earlier candidate.
pub fn best_candidate<'a>(
    reference: &Reference,
    candidates: &'a [Candidate],
) -> Option<(&'a Candidate, f64)> {
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates {
        let score = candidate_confidence(reference, candidate);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.filter(|(_, score)| *score >= MIN_CANDIDATE_CONFIDENCE)
}
