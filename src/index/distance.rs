//! Distance functions.

/// Squared Euclidean (L2) distance.
///
/// The square root is skipped: it preserves ordering and matches the
/// distances reported by flat L2 indexes.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Index of the centroid nearest to `v`. Ties go to the lower index.
///
/// Returns `None` when `centroids` is empty.
pub fn nearest_centroid(v: &[f32], centroids: &[Vec<f32>]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in centroids.iter().enumerate() {
        let d = euclidean_distance(v, c);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}
