use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::VecdexError;

/// A unique identifier for a vector within an index.
pub type VectorId = i64;

/// Arbitrary structured object attached to a vector.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Index type for a named index.
///
/// Serialized with the short names used in sidecar records (`Flat`, `IVF`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Brute-force scan over the full corpus.
    #[default]
    #[serde(rename = "Flat")]
    Exact,
    /// IVF-Flat: k-means partitions, only the nearest partitions are scanned.
    #[serde(rename = "IVF")]
    ApproximateClustered,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Exact => "Flat",
            IndexType::ApproximateClustered => "IVF",
        }
    }

    /// Whether handles of this type need a training pass before use.
    pub fn requires_training(&self) -> bool {
        matches!(self, IndexType::ApproximateClustered)
    }
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = VecdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "exact" => Ok(IndexType::Exact),
            "ivf" | "ivfflat" | "ivf_flat" | "approximateclustered" | "approximate_clustered" => {
                Ok(IndexType::ApproximateClustered)
            }
            _ => Err(VecdexError::UnsupportedIndexType {
                token: s.to_string(),
            }),
        }
    }
}

/// A raw neighbor produced by an index handle, before metadata enrichment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: VectorId,
    pub distance: f64,
}

/// A search result containing the vector ID, distance, and optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: VectorId,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}
