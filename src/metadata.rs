//! Per-index metadata: vector id -> JSON object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Metadata, VectorId};

/// Metadata objects keyed by vector id.
///
/// Serialized as a JSON object keyed by the decimal id string, the layout of
/// the sidecar record. Entries are optional per vector and are not checked
/// against the ids present in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataStore {
    entries: BTreeMap<String, Metadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `object` to `id`, replacing any previous entry.
    pub fn attach(&mut self, id: VectorId, object: Metadata) {
        self.entries.insert(id.to_string(), object);
    }

    pub fn lookup(&self, id: VectorId) -> Option<&Metadata> {
        self.entries.get(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
