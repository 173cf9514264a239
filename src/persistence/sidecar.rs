use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metadata::MetadataStore;
use crate::registry::IndexDescriptor;
use crate::types::IndexType;

/// The JSON record stored next to each index blob.
///
/// It is written after the blob and names the blob's key and checksum, so it
/// acts as the commit record for the pair: a blob only counts once a sidecar
/// vouching for it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    pub name: String,
    pub dimension: usize,
    pub index_type: IndexType,
    pub count: u64,
    #[serde(default)]
    pub trained: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Key of the blob this record commits.
    pub blob: String,
    /// xxh3 of that blob.
    pub blob_checksum: u64,
    #[serde(default)]
    pub metadata: MetadataStore,
}

impl Sidecar {
    pub fn new(
        descriptor: &IndexDescriptor,
        metadata: &MetadataStore,
        blob: String,
        blob_checksum: u64,
    ) -> Self {
        Self {
            name: descriptor.name.clone(),
            dimension: descriptor.dimension,
            index_type: descriptor.index_type,
            count: descriptor.vector_count,
            trained: descriptor.trained,
            created_at: descriptor.created_at,
            updated_at: descriptor.updated_at,
            blob,
            blob_checksum,
            metadata: metadata.clone(),
        }
    }

    /// Rebuild the descriptor for `name` from this record.
    pub fn descriptor(&self, name: &str) -> IndexDescriptor {
        IndexDescriptor {
            name: name.to_string(),
            dimension: self.dimension,
            index_type: self.index_type,
            vector_count: self.count,
            trained: self.trained,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let json = serde_json::to_vec_pretty(self)?;
        Ok(Bytes::from(json))
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
