//! Candidate ranking shared by the index variants.

use std::cmp::Ordering;

use crate::types::{Neighbor, VectorId};

/// A scored vector before final ranking.
///
/// `seq` is the vector's insertion sequence number, used to break distance
/// ties so results are stable across calls and across a reload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub id: VectorId,
    pub distance: f32,
    pub seq: u64,
}

fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.seq.cmp(&b.seq))
}

/// Keep the `k` best candidates, ascending by distance then insertion order.
pub(crate) fn top_k(mut candidates: Vec<Candidate>, k: usize) -> Vec<Neighbor> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, rank);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank);
    candidates
        .into_iter()
        .map(|c| Neighbor {
            id: c.id,
            distance: f64::from(c.distance),
        })
        .collect()
}
