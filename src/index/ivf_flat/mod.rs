//! IVF-Flat index implementation.
//!
//! An Inverted File index with flat (uncompressed) vector storage.
//! Vectors are partitioned by nearest k-means centroid, and at search time
//! only the `nprobe` closest partitions are scanned. Vectors in unscanned
//! partitions are never returned, even when they are true nearest neighbors.

pub mod kmeans;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VecdexError};
use crate::index::candidate::{top_k, Candidate};
use crate::index::distance::{euclidean_distance, nearest_centroid};
use crate::index::traits::{validate_batch, validate_query, validate_vector, VectorIndex};
use crate::types::{Neighbor, VectorId};

use kmeans::{train_centroids, KMeansParams};

/// Vectors assigned to one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedList {
    ids: Vec<VectorId>,
    /// Insertion sequence numbers, parallel to `ids`.
    seqs: Vec<u64>,
    /// Row-major vector values.
    data: Vec<f32>,
}

impl InvertedList {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvfFlatIndex {
    dim: usize,
    num_partitions: usize,
    /// Empty until trained; then `num_partitions` centroids of length `dim`.
    centroids: Vec<Vec<f32>>,
    lists: Vec<InvertedList>,
    /// Next insertion sequence number.
    next_seq: u64,
}

impl IvfFlatIndex {
    /// An untrained index with room for `num_partitions` partitions.
    pub fn new(dim: usize, num_partitions: usize) -> Self {
        Self {
            dim,
            num_partitions,
            centroids: Vec::new(),
            lists: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    /// Sizes of the inverted lists, in partition order.
    pub fn partition_sizes(&self) -> Vec<usize> {
        self.lists.iter().map(InvertedList::len).collect()
    }

    /// Compute partition centroids from a real sample.
    ///
    /// # Errors
    /// `InsufficientTrainingData` when the sample has fewer distinct vectors
    /// than partitions, `DimensionMismatch` for a wrong-length sample vector, and
    /// `Validation` when the index already holds vectors.
    pub fn train(&mut self, sample: &[Vec<f32>], params: &KMeansParams) -> Result<()> {
        if self.vector_count() > 0 {
            return Err(VecdexError::Validation(
                "cannot retrain an index that already holds vectors".into(),
            ));
        }
        if sample.len() < self.num_partitions {
            return Err(VecdexError::InsufficientTrainingData {
                required: self.num_partitions,
                actual: sample.len(),
            });
        }
        for v in sample {
            validate_vector(self.dim, v)?;
        }
        let distinct = distinct_count(sample);
        if distinct < self.num_partitions {
            return Err(VecdexError::InsufficientTrainingData {
                required: self.num_partitions,
                actual: distinct,
            });
        }

        let params = KMeansParams {
            k: self.num_partitions,
            ..*params
        };
        self.centroids = train_centroids(sample, self.dim, &params);
        self.lists = vec![InvertedList::default(); self.num_partitions];
        Ok(())
    }
}

/// Number of distinct points in `sample`. `-0.0` and `0.0` count as one.
fn distinct_count(sample: &[Vec<f32>]) -> usize {
    sample
        .iter()
        .map(|v| {
            v.iter()
                .map(|&x| if x == 0.0 { 0 } else { x.to_bits() })
                .collect::<Vec<u32>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

impl VectorIndex for IvfFlatIndex {
    fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()> {
        if !self.is_trained() {
            return Err(VecdexError::NotTrained);
        }
        validate_batch(self.dim, vectors, ids)?;

        for (v, &id) in vectors.iter().zip(ids) {
            let p = nearest_centroid(v, &self.centroids).ok_or(VecdexError::NotTrained)?;
            let list = &mut self.lists[p];
            list.ids.push(id);
            list.seqs.push(self.next_seq);
            list.data.extend_from_slice(v);
            self.next_seq += 1;
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k_count: usize, nprobe: usize) -> Result<Vec<Neighbor>> {
        if !self.is_trained() {
            return Err(VecdexError::NotTrained);
        }
        validate_query(self.dim, query, top_k_count)?;

        let nprobe = nprobe.clamp(1, self.centroids.len());
        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, euclidean_distance(query, c)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(nprobe);

        let mut candidates = Vec::new();
        for &(p, _) in &ranked {
            let list = &self.lists[p];
            for (j, (&id, &seq)) in list.ids.iter().zip(&list.seqs).enumerate() {
                let row = &list.data[j * self.dim..(j + 1) * self.dim];
                candidates.push(Candidate {
                    id,
                    distance: euclidean_distance(query, row),
                    seq,
                });
            }
        }

        let scanned = candidates.len();
        let results = top_k(candidates, top_k_count);
        debug!(
            nprobe,
            scanned,
            returned = results.len(),
            "ivf-flat search complete"
        );
        Ok(results)
    }

    fn vector_count(&self) -> usize {
        self.lists.iter().map(InvertedList::len).sum()
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }
}
