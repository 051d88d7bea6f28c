use std::cmp::Ordering;
use std::collections::HashSet;

use super::*;

/// Rank, deduplicate, then restore reading order.
pub fn finalize_pairs(mut pairs: Vec<Pair>) -> Vec<Pair> {
    rank_pairs(&mut pairs);
    let mut pairs = dedup_pairs(pairs);
    order_for_presentation(&mut pairs);
    pairs
}

/// Descending confidence, then ascending key-to-value distance. Stable.
pub fn rank_pairs(pairs: &mut [Pair]) {
    pairs.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| compare_distance(a.distance, b.distance))
    });
}

/// Keeps the first occurrence of each exact (key, value) text.
pub fn dedup_pairs(pairs: Vec<Pair>) -> Vec<Pair> {
    let mut seen = HashSet::<(String, String)>::with_capacity(pairs.len());
    pairs
        .into_iter()
        .filter(|pair| seen.insert((pair.key.clone(), pair.value.clone())))
        .collect()
}

pub fn order_for_presentation(pairs: &mut [Pair]) {
    pairs.sort_by(|a, b| {
        a.position
            .top
            .total_cmp(&b.position.top)
            .then_with(|| a.position.left.total_cmp(&b.position.left))
    });
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(f64::INFINITY)
        .total_cmp(&b.unwrap_or(f64::INFINITY))
}
