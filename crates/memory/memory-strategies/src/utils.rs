//! Shared utilities for strategies.

use std::collections::HashSet;

use memory_core::ScoredMemory;

/// Concatenates memory lists in order, keeping the first occurrence of each id.
pub fn merge_unique<I>(lists: I) -> Vec<ScoredMemory>
where
    I: IntoIterator<Item = Vec<ScoredMemory>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for memory in list {
            if seen.insert(memory.entry.id) {
                merged.push(memory);
            }
        }
    }
    merged
}

pub(crate) fn score_stats(scores: &[f32]) -> Option<(f32, f32, f32)> {
    if scores.is_empty() {
        return None;
    }
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    Some((min, mean, max))
}
