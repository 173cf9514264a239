//! Core trait definition for vector index implementations.
//!
//! Every index variant (flat, IVF-Flat) implements `VectorIndex` so the
//! handle enum can dispatch to them uniformly.

use crate::error::{Result, VecdexError};
use crate::types::{Neighbor, VectorId};

/// Trait that all vecdex index implementations must satisfy.
pub trait VectorIndex {
    /// Append `vectors` under `ids`.
    ///
    /// Implementations validate the whole batch before touching any state,
    /// so a failed call leaves the index unchanged.
    ///
    /// # Errors
    /// `DimensionMismatch` if any vector has the wrong length,
    /// `IdCountMismatch` if `ids` and `vectors` differ in length,
    /// `NotTrained` for an index that needs training first.
    fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()>;

    /// Search for the `top_k` nearest neighbors of `query`.
    ///
    /// # Arguments
    /// * `query`  - The query vector (must match index dimensionality).
    /// * `top_k`  - Number of results to return.
    /// * `nprobe` - Number of partitions to scan (ignored by flat indexes).
    fn search(&self, query: &[f32], top_k: usize, nprobe: usize) -> Result<Vec<Neighbor>>;

    /// Return the total number of vectors in this index.
    fn vector_count(&self) -> usize;

    /// Return the dimensionality of vectors in this index.
    fn dimension(&self) -> usize;

    /// Whether the index is ready for `add` and `search`.
    fn is_trained(&self) -> bool;
}

/// Check that one vector has the expected length and only finite values.
pub(crate) fn validate_vector(dim: usize, v: &[f32]) -> Result<()> {
    if v.len() != dim {
        return Err(VecdexError::DimensionMismatch {
            expected: dim,
            actual: v.len(),
        });
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(VecdexError::Validation(
            "vector values must be finite".into(),
        ));
    }
    Ok(())
}

/// Validate a full add batch before any mutation.
pub(crate) fn validate_batch(dim: usize, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()> {
    if ids.len() != vectors.len() {
        return Err(VecdexError::IdCountMismatch {
            ids: ids.len(),
            vectors: vectors.len(),
        });
    }
    for v in vectors {
        validate_vector(dim, v)?;
    }
    Ok(())
}

/// Validate a search request against the index dimension.
pub(crate) fn validate_query(dim: usize, query: &[f32], top_k: usize) -> Result<()> {
    validate_vector(dim, query)?;
    if top_k == 0 {
        return Err(VecdexError::Validation("k must be > 0".into()));
    }
    Ok(())
}
