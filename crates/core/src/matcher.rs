//! Aspect aggregation and ranking shared by the similarity-based strategies.

use crate::models::{Query, ScoredCandidate, ServiceDescriptor};
use crate::registry::Registry;
use crate::similarity::Similarity;

pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Sums the accepted per-aspect scores of one entry. Scores below `threshold` are
/// dropped entirely. Returns `None` when no aspect was accepted.
pub fn score_entry<S: Similarity + ?Sized>(
    service: &ServiceDescriptor,
    query: &Query,
    similarity: &S,
    threshold: f64,
) -> Option<(f64, usize)> {
    let mut total = 0.0;
    let mut matched = 0usize;
    for (aspect, text) in query.aspects() {
        let Some(value) = service.field(aspect).filter(|v| !v.is_empty()) else {
            continue;
        };
        let sim = similarity.similarity(text, value);
        if sim >= threshold {
            total += sim;
            matched += 1;
        }
    }
    (matched > 0).then_some((total, matched))
}

pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

pub fn match_services<S: Similarity + ?Sized>(
    registry: &Registry,
    query: &Query,
    similarity: &S,
    threshold: f64,
) -> Vec<ScoredCandidate> {
    let scored = registry
        .services()
        .iter()
        .filter_map(|service| {
            score_entry(service, query, similarity, threshold).map(|(score, matched_aspects)| {
                ScoredCandidate {
                    service: service.clone(),
                    score,
                    matched_aspects,
                }
            })
        })
        .collect();
    rank(scored)
}
