use super::*;

use crate::config::ScoringWeights;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    /// False when a single candidate was taken without scoring.
    pub scored: bool,
    pub score: Option<f64>,
}

/// Picks one value for `key`. A lone candidate is taken as is; otherwise the
/// highest score wins and ties keep the earliest candidate.
pub fn select_candidate(
    key: &FieldCandidate,
    candidates: &[FieldCandidate],
    patterns: &PatternTable,
    weights: &ScoringWeights,
) -> Selection {
    if candidates.len() <= 1 {
        return Selection {
            index: 0,
            scored: false,
            score: None,
        };
    }

    let mut best_index = 0usize;
    let mut best_score = f64::NEG_INFINITY;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = score_candidate(key, candidate, patterns, weights);
        if score > best_score {
            best_score = score;
            best_index = index;
        }
    }

    Selection {
        index: best_index,
        scored: true,
        score: Some(best_score),
    }
}

pub fn score_candidate(
    key: &FieldCandidate,
    candidate: &FieldCandidate,
    patterns: &PatternTable,
    weights: &ScoringWeights,
) -> f64 {
    let pattern_share = match (key.bounding_box, candidate.bounding_box) {
        (Some(key_box), Some(value_box)) => {
            patterns.signature_share(&OffsetSignature::between(&key_box, &value_box))
        }
        _ => 0.0,
    };

    let separator_bonus = match patterns.dominant_separator() {
        Some(dominant) if Separator::detect(&key.text) == Some(dominant) => {
            weights.separator_agreement
        }
        _ => 0.0,
    };

    let capitalization_bonus = if CaseStyle::agrees(&key.text, &candidate.text) {
        weights.capitalization_agreement
    } else {
        0.0
    };

    weights.pattern_frequency * pattern_share
        + weights.confidence * candidate.confidence
        + separator_bonus
        + capitalization_bonus
}
