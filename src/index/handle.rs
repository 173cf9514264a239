//! `VectorIndexHandle`: the per-index engine, tagged by index type.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecdexError};
use crate::index::flat::FlatIndex;
use crate::index::ivf_flat::kmeans::KMeansParams;
use crate::index::ivf_flat::IvfFlatIndex;
use crate::index::traits::VectorIndex;
use crate::types::{IndexType, Neighbor, VectorId};

/// Bumped whenever the blob layout changes incompatibly.
const BLOB_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorIndexHandle {
    Exact(FlatIndex),
    ApproximateClustered(IvfFlatIndex),
}

impl VectorIndexHandle {
    pub fn index_type(&self) -> IndexType {
        match self {
            VectorIndexHandle::Exact(_) => IndexType::Exact,
            VectorIndexHandle::ApproximateClustered(_) => IndexType::ApproximateClustered,
        }
    }

    fn inner(&self) -> &dyn VectorIndex {
        match self {
            VectorIndexHandle::Exact(i) => i,
            VectorIndexHandle::ApproximateClustered(i) => i,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn VectorIndex {
        match self {
            VectorIndexHandle::Exact(i) => i,
            VectorIndexHandle::ApproximateClustered(i) => i,
        }
    }

    pub fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()> {
        self.inner_mut().add(vectors, ids)
    }

    pub fn search(&self, query: &[f32], top_k: usize, nprobe: usize) -> Result<Vec<Neighbor>> {
        self.inner().search(query, top_k, nprobe)
    }

    /// Train the handle on a sample. A no-op for exact indexes.
    pub fn train(&mut self, sample: &[Vec<f32>], params: &KMeansParams) -> Result<()> {
        match self {
            VectorIndexHandle::Exact(_) => Ok(()),
            VectorIndexHandle::ApproximateClustered(i) => i.train(sample, params),
        }
    }

    pub fn vector_count(&self) -> usize {
        self.inner().vector_count()
    }

    pub fn dimension(&self) -> usize {
        self.inner().dimension()
    }

    pub fn is_trained(&self) -> bool {
        self.inner().is_trained()
    }

    /// Encode the handle as a versioned bincode blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(BLOB_FORMAT_VERSION, self))?)
    }

    /// Decode a blob produced by `to_bytes`.
    ///
    /// Returns `Bincode` for undecodable bytes and `Validation` for an unknown
    /// format version; the persistence layer reports both as corrupt state.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (version, handle): (u32, VectorIndexHandle) = bincode::deserialize(data)?;
        if version != BLOB_FORMAT_VERSION {
            return Err(VecdexError::Validation(format!(
                "unsupported blob format version {version}"
            )));
        }
        Ok(handle)
    }
}
