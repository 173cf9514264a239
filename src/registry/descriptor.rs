use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VecdexError};
use crate::types::IndexType;

const MAX_NAME_LEN: usize = 128;

/// Bookkeeping for one named index, kept beside its handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: usize,
    pub index_type: IndexType,
    /// Number of vectors ever added. Never decreases.
    pub vector_count: u64,
    pub trained: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IndexDescriptor {
    pub fn new(name: &str, dimension: usize, index_type: IndexType, trained: bool) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            dimension,
            index_type,
            vector_count: 0,
            trained,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record `added` new vectors.
    pub fn record_added(&mut self, added: usize) {
        self.vector_count += added as u64;
        self.updated_at = Utc::now();
    }

    pub fn mark_trained(&mut self) {
        self.trained = true;
        self.updated_at = Utc::now();
    }
}

/// Index names become storage keys, so they are restricted to
/// `[A-Za-z0-9_-]{1,128}`.
pub fn validate_index_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(VecdexError::Validation(format!(
            "index name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(VecdexError::Validation(format!(
            "index name '{name}' may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
