use vecdex::error::VecdexError;
use vecdex::index::distance::euclidean_distance;
use vecdex::types::{SearchResult, VectorId};

/// Assert that distances are non-decreasing.
pub fn assert_ascending(results: &[SearchResult]) {
    for pair in results.windows(2) {
        assert!(
            pair[0].distance <= pair[1].distance,
            "results not in ascending distance order: {} then {}",
            pair[0].distance,
            pair[1].distance
        );
    }
}

/// Assert that search results contain all expected ids (order-independent).
pub fn assert_results_contain(results: &[SearchResult], expected: &[VectorId]) {
    let ids: Vec<VectorId> = results.iter().map(|r| r.id).collect();
    for id in expected {
        assert!(
            ids.contains(id),
            "search results do not contain expected id {id}. Got: {ids:?}"
        );
    }
}

/// Assert that the top result has the expected id.
pub fn assert_top_result(results: &[SearchResult], expected: VectorId) {
    assert!(!results.is_empty(), "expected results, got none");
    assert_eq!(
        results[0].id, expected,
        "expected top result {expected}, got {}",
        results[0].id
    );
}

/// Brute-force k nearest ids of `query` over `corpus`, where vector `i`
/// carries id `i`.
pub fn brute_force_top_k(corpus: &[Vec<f32>], query: &[f32], k: usize) -> Vec<VectorId> {
    let mut scored: Vec<(f32, VectorId)> = corpus
        .iter()
        .enumerate()
        .map(|(i, v)| (euclidean_distance(query, v), i as VectorId))
        .collect();
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.into_iter().take(k).map(|(_, id)| id).collect()
}

/// Fraction of the true top-k found in `results`.
pub fn recall_at_k(results: &[SearchResult], truth: &[VectorId]) -> f64 {
    if truth.is_empty() {
        return 1.0;
    }
    let hits = truth
        .iter()
        .filter(|id| results.iter().any(|r| r.id == **id))
        .count();
    hits as f64 / truth.len() as f64
}

pub fn assert_recall_at_k(results: &[SearchResult], truth: &[VectorId], min_recall: f64) {
    let recall = recall_at_k(results, truth);
    assert!(
        recall >= min_recall,
        "recall@{} = {recall:.3}, expected >= {min_recall:.3}",
        truth.len()
    );
}

pub fn assert_index_not_found<T: std::fmt::Debug>(result: Result<T, VecdexError>) {
    match result {
        Err(VecdexError::IndexNotFound { .. }) => {}
        other => panic!("expected IndexNotFound, got {other:?}"),
    }
}
