//! Flat (exact) index: brute-force scan over the whole corpus.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::index::candidate::{top_k, Candidate};
use crate::index::distance::euclidean_distance;
use crate::index::traits::{validate_batch, validate_query, VectorIndex};
use crate::types::{Neighbor, VectorId};

/// Exact index. Vectors are stored contiguously in insertion order, so the
/// position of a vector doubles as its tie-break sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dim: usize,
    ids: Vec<VectorId>,
    /// Row-major `ids.len() * dim` values.
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            ids: Vec::new(),
            data: Vec::new(),
        }
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()> {
        validate_batch(self.dim, vectors, ids)?;

        self.ids.reserve(ids.len());
        self.data.reserve(vectors.len() * self.dim);
        for (v, id) in vectors.iter().zip(ids) {
            self.ids.push(*id);
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], top_k_count: usize, _nprobe: usize) -> Result<Vec<Neighbor>> {
        validate_query(self.dim, query, top_k_count)?;

        let candidates: Vec<Candidate> = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, &id)| Candidate {
                id,
                distance: euclidean_distance(query, self.row(i)),
                seq: i as u64,
            })
            .collect();

        let scanned = candidates.len();
        let results = top_k(candidates, top_k_count);
        debug!(scanned, returned = results.len(), "flat search complete");
        Ok(results)
    }

    fn vector_count(&self) -> usize {
        self.ids.len()
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_trained(&self) -> bool {
        true
    }
}
