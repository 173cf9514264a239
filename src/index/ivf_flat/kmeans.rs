//! k-means training for IVF partition centroids.
//!
//! k-means++ seeding followed by Lloyd iterations. Seeded, so the same
//! sample and parameters always produce the same centroids.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::IndexingConfig;
use crate::index::distance::{euclidean_distance, nearest_centroid};

#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iterations: usize,
    /// Stop once no centroid moves more than this (squared L2).
    pub epsilon: f32,
    pub seed: u64,
}

impl KMeansParams {
    pub fn from_config(config: &IndexingConfig) -> Self {
        Self {
            k: config.num_partitions,
            max_iterations: config.kmeans_max_iterations,
            epsilon: config.kmeans_convergence_epsilon,
            seed: config.kmeans_seed,
        }
    }
}

/// Train `params.k` centroids on `sample`.
///
/// Callers guarantee that `sample` holds at least `params.k > 0` distinct
/// points and that every sample vector has length `dim`.
pub fn train_centroids(sample: &[Vec<f32>], dim: usize, params: &KMeansParams) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids = kmeans_plus_plus(sample, params.k, &mut rng);
    let mut assignments = vec![0usize; sample.len()];

    let mut iterations = 0;
    for _ in 0..params.max_iterations {
        iterations += 1;

        for (slot, v) in assignments.iter_mut().zip(sample) {
            *slot = nearest_centroid(v, &centroids).unwrap_or(0);
        }

        let mut sums = vec![vec![0.0f32; dim]; params.k];
        let mut counts = vec![0usize; params.k];
        for (v, &c) in sample.iter().zip(&assignments) {
            counts[c] += 1;
            for (s, x) in sums[c].iter_mut().zip(v) {
                *s += x;
            }
        }

        let mut max_shift = 0.0f32;
        for (c, centroid) in centroids.iter_mut().enumerate() {
            // Empty partitions keep their previous centroid.
            if counts[c] == 0 {
                continue;
            }
            let n = counts[c] as f32;
            let updated: Vec<f32> = sums[c].iter().map(|s| s / n).collect();
            max_shift = max_shift.max(euclidean_distance(centroid, &updated));
            *centroid = updated;
        }

        if max_shift < params.epsilon {
            break;
        }
    }

    debug!(
        k = params.k,
        samples = sample.len(),
        iterations,
        "k-means training complete"
    );
    centroids
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn kmeans_plus_plus(sample: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(sample[rng.gen_range(0..sample.len())].clone());

    let mut min_dist: Vec<f32> = sample
        .iter()
        .map(|v| euclidean_distance(v, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f32 = min_dist.iter().sum();
        let chosen = if total <= 0.0 {
            // Every point coincides with a chosen centroid.
            rng.gen_range(0..sample.len())
        } else {
            let threshold = rng.gen::<f32>() * total;
            let mut cumulative = 0.0f32;
            min_dist
                .iter()
                .position(|&d| {
                    cumulative += d;
                    d > 0.0 && cumulative >= threshold
                })
                .or_else(|| min_dist.iter().rposition(|&d| d > 0.0))
                .unwrap_or(sample.len() - 1)
        };

        let next = sample[chosen].clone();
        for (d, v) in min_dist.iter_mut().zip(sample) {
            *d = d.min(euclidean_distance(v, &next));
        }
        centroids.push(next);
    }

    centroids
}
