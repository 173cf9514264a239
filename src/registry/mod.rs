//! Name -> index mapping with one read/write section per index.
//!
//! The map itself is a `DashMap`, so looking up one name never waits on
//! another. Each entry sits behind its own `tokio::sync::RwLock`, held for a
//! whole logical operation: searches share it, mutations take it exclusively.
//! Map guards are always dropped before awaiting a lock.

pub mod descriptor;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::debug;

use crate::error::{Result, VecdexError};
use crate::index::VectorIndexHandle;
use crate::metadata::MetadataStore;

pub use descriptor::{validate_index_name, IndexDescriptor};

/// The triple the registry tracks per name.
#[derive(Debug)]
pub struct IndexEntry {
    pub descriptor: IndexDescriptor,
    pub handle: VectorIndexHandle,
    pub metadata: MetadataStore,
    /// Key of the blob named by the last committed sidecar, if any.
    pub(crate) committed_blob: Option<String>,
    /// Set once the entry has been removed; waiters treat it as missing.
    retired: bool,
}

impl IndexEntry {
    pub fn new(
        descriptor: IndexDescriptor,
        handle: VectorIndexHandle,
        metadata: MetadataStore,
    ) -> Self {
        Self {
            descriptor,
            handle,
            metadata,
            committed_blob: None,
            retired: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

type IndexSlot = Arc<RwLock<IndexEntry>>;

/// Exclusive access to one registered index.
pub struct IndexWriteGuard {
    slot: IndexSlot,
    guard: OwnedRwLockWriteGuard<IndexEntry>,
}

impl Deref for IndexWriteGuard {
    type Target = IndexEntry;

    fn deref(&self) -> &IndexEntry {
        &self.guard
    }
}

impl DerefMut for IndexWriteGuard {
    fn deref_mut(&mut self) -> &mut IndexEntry {
        &mut self.guard
    }
}

/// Shared access to one registered index.
pub type IndexReadGuard = OwnedRwLockReadGuard<IndexEntry>;

#[derive(Default)]
pub struct IndexRegistry {
    indexes: DashMap<String, IndexSlot>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new entry under its descriptor name.
    ///
    /// The entry is returned already write-locked, so the caller can persist it
    /// before any other operation on the name gets through.
    pub async fn register(&self, entry: IndexEntry) -> Result<IndexWriteGuard> {
        let name = entry.name().to_string();
        let slot: IndexSlot = Arc::new(RwLock::new(entry));
        let guard = slot.clone().write_owned().await;

        match self.indexes.entry(name.clone()) {
            Entry::Occupied(_) => Err(VecdexError::DuplicateIndex { name }),
            Entry::Vacant(vacant) => {
                vacant.insert(slot.clone());
                debug!(index = %name, "registered index");
                Ok(IndexWriteGuard { slot, guard })
            }
        }
    }

    fn slot(&self, name: &str) -> Result<IndexSlot> {
        self.indexes
            .get(name)
            .map(|s| s.value().clone())
            .ok_or_else(|| VecdexError::IndexNotFound {
                name: name.to_string(),
            })
    }

    /// Shared access to `name`, waiting for any in-flight mutation.
    pub async fn read(&self, name: &str) -> Result<IndexReadGuard> {
        let guard = self.slot(name)?.read_owned().await;
        if guard.retired {
            return Err(VecdexError::IndexNotFound {
                name: name.to_string(),
            });
        }
        Ok(guard)
    }

    /// Exclusive access to `name`, waiting for readers and writers to finish.
    pub async fn write(&self, name: &str) -> Result<IndexWriteGuard> {
        let slot = self.slot(name)?;
        let guard = slot.clone().write_owned().await;
        if guard.retired {
            return Err(VecdexError::IndexNotFound {
                name: name.to_string(),
            });
        }
        Ok(IndexWriteGuard { slot, guard })
    }

    /// Remove the entry held by `guard`. Callers still queued on it will see
    /// `IndexNotFound`.
    pub fn remove(&self, guard: &mut IndexWriteGuard) -> Result<()> {
        let name = guard.name().to_string();
        if guard.retired {
            return Err(VecdexError::IndexNotFound { name });
        }
        guard.retired = true;
        let slot = guard.slot.clone();
        self.indexes
            .remove_if(&name, |_, current| Arc::ptr_eq(current, &slot));
        debug!(index = %name, "removed index");
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Snapshot of every descriptor, sorted by name.
    ///
    /// Each descriptor is read under its index's shared lock, so an index in
    /// the middle of a mutation is reported as of that mutation's completion.
    pub async fn list_all(&self) -> Vec<IndexDescriptor> {
        let slots: Vec<IndexSlot> = self.indexes.iter().map(|e| e.value().clone()).collect();

        let mut descriptors = Vec::with_capacity(slots.len());
        for slot in slots {
            let entry = slot.read().await;
            if !entry.retired {
                descriptors.push(entry.descriptor.clone());
            }
        }
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}
