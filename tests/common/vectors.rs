use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use vecdex::types::Metadata;

/// Generate `n` random vectors of dimension `dims` with uniform f32 values in [-1, 1].
pub fn random_vectors(n: usize, dims: usize) -> Vec<Vec<f32>> {
    random_vectors_seeded(n, dims, 42)
}

pub fn random_vectors_seeded(n: usize, dims: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Generate vectors clustered around `n_clusters` known centroids.
/// Returns (vectors, centroids); vectors are laid out cluster by cluster.
///
/// Each centroid is a random unit vector. Vectors in each cluster are the
/// centroid plus uniform noise in [-noise, noise].
pub fn clustered_vectors(
    n_clusters: usize,
    n_per_cluster: usize,
    dims: usize,
    noise: f32,
) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let mut rng = StdRng::seed_from_u64(123);

    let centroids: Vec<Vec<f32>> = (0..n_clusters)
        .map(|_| {
            let v: Vec<f32> = (0..dims).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            v.iter().map(|x| x / norm).collect()
        })
        .collect();

    let mut vectors = Vec::with_capacity(n_clusters * n_per_cluster);
    for centroid in &centroids {
        for _ in 0..n_per_cluster {
            vectors.push(
                centroid
                    .iter()
                    .map(|&c| c + rng.gen_range(-noise..noise))
                    .collect(),
            );
        }
    }

    (vectors, centroids)
}

/// One metadata object per vector, tagged with its position.
pub fn tagged_metadata(n: usize) -> Vec<Option<Metadata>> {
    (0..n)
        .map(|i| {
            json!({ "tag": format!("item_{i}"), "position": i })
                .as_object()
                .cloned()
        })
        .collect()
}
