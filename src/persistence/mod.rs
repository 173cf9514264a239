//! Durable storage of index triples.
//!
//! Each index is stored as two kinds of object in the store root: a bincode
//! handle blob under a content-addressed key `<name>.<xxh3 hex>.index`, and
//! the sidecar `<name>.metadata.json` naming the current blob. A persist
//! writes the new blob next to the old one, then replaces the sidecar, and
//! only then deletes the old blob. Whatever point a write stops at, the
//! sidecar on disk names a complete blob.
//!
//! Every mutation rewrites the whole blob, so write cost grows with corpus
//! size.

pub mod sidecar;

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Result, VecdexError};
use crate::index::VectorIndexHandle;
use crate::registry::{validate_index_name, IndexEntry, IndexRegistry};
use crate::storage::VecdexStore;

pub use sidecar::Sidecar;

const BLOB_SUFFIX: &str = ".index";
const SIDECAR_SUFFIX: &str = ".metadata.json";

pub fn blob_checksum(blob: &[u8]) -> u64 {
    xxh3_64(blob)
}

pub fn blob_key(name: &str, checksum: u64) -> String {
    format!("{name}.{checksum:016x}{BLOB_SUFFIX}")
}

pub fn sidecar_key(name: &str) -> String {
    format!("{name}{SIDECAR_SUFFIX}")
}

/// Split a blob key into its index name and checksum.
pub fn parse_blob_key(key: &str) -> Option<(&str, u64)> {
    let stem = key.strip_suffix(BLOB_SUFFIX)?;
    let (name, hex) = stem.rsplit_once('.')?;
    if hex.len() != 16 {
        return None;
    }
    let checksum = u64::from_str_radix(hex, 16).ok()?;
    Some((name, checksum))
}

/// An index restored at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredIndex {
    pub name: String,
    pub vector_count: u64,
}

/// Outcome of `load_all`: what was restored and what could not be.
///
/// A restored index can still appear in `failures` when a blob its sidecar
/// does not name was found next to it.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub restored: Vec<RestoredIndex>,
    pub failures: Vec<(String, VecdexError)>,
}

pub struct PersistenceManager {
    store: VecdexStore,
}

impl PersistenceManager {
    pub fn new(store: VecdexStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &VecdexStore {
        &self.store
    }

    /// Write the current state of `entry`. Storage failures come back as
    /// `PersistenceFailure`; the in-memory entry is left as it is and the
    /// previously committed pair stays readable.
    #[instrument(skip(self, entry), fields(index = entry.name()))]
    pub async fn persist(&self, entry: &mut IndexEntry) -> Result<()> {
        let name = entry.name().to_string();
        let start = std::time::Instant::now();

        let blob = entry
            .handle
            .to_bytes()
            .map_err(|e| VecdexError::persistence(&name, e))?;
        let checksum = blob_checksum(&blob);
        let key = blob_key(&name, checksum);
        let sidecar = Sidecar::new(&entry.descriptor, &entry.metadata, key.clone(), checksum)
            .to_bytes()
            .map_err(|e| VecdexError::persistence(&name, e))?;

        let blob_len = blob.len();
        self.store
            .put(&key, Bytes::from(blob))
            .await
            .map_err(|e| VecdexError::persistence(&name, e))?;

        if let Err(e) = self.store.put(&sidecar_key(&name), sidecar).await {
            if entry.committed_blob.as_deref() != Some(key.as_str()) {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!(blob = %key, error = %cleanup, "failed to remove uncommitted blob");
                }
            }
            return Err(VecdexError::persistence(&name, e));
        }

        if let Some(previous) = entry.committed_blob.replace(key.clone()) {
            if previous != key {
                if let Err(e) = self.store.delete(&previous).await {
                    warn!(blob = %previous, error = %e, "failed to remove superseded blob");
                }
            }
        }

        let elapsed = start.elapsed();
        crate::metrics::PERSIST_DURATION
            .with_label_values(&[name.as_str()])
            .observe(elapsed.as_secs_f64());
        debug!(
            blob = %key,
            blob_bytes = blob_len,
            vectors = entry.descriptor.vector_count,
            elapsed_ms = elapsed.as_millis(),
            "persisted index"
        );
        Ok(())
    }

    /// Keys of every blob stored for `name`, committed or not.
    async fn blob_keys(&self, name: &str) -> Result<Vec<String>> {
        let keys = self.store.list_keys().await?;
        Ok(keys
            .into_iter()
            .filter(|k| matches!(parse_blob_key(k), Some((n, _)) if n == name))
            .collect())
    }

    /// Delete every durable object for `name`, sidecar first. Missing
    /// objects are ignored.
    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Result<()> {
        self.store
            .delete(&sidecar_key(name))
            .await
            .map_err(|e| VecdexError::persistence(name, e))?;
        let blobs = self
            .blob_keys(name)
            .await
            .map_err(|e| VecdexError::persistence(name, e))?;
        for key in blobs {
            self.store
                .delete(&key)
                .await
                .map_err(|e| VecdexError::persistence(name, e))?;
        }
        Ok(())
    }

    /// Reconstruct one index from its sidecar and the blob it names.
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<IndexEntry> {
        validate_index_name(name).map_err(|e| VecdexError::corrupt(name, e.to_string()))?;

        let sidecar_bytes = match self.store.get(&sidecar_key(name)).await {
            Ok(b) => b,
            Err(VecdexError::NotFound { .. }) => {
                return Err(VecdexError::corrupt(name, "no sidecar record"))
            }
            Err(e) => return Err(e),
        };
        let sidecar = Sidecar::from_bytes(&sidecar_bytes)
            .map_err(|e| VecdexError::corrupt(name, format!("unreadable sidecar: {e}")))?;

        if sidecar.name != name {
            return Err(VecdexError::corrupt(
                name,
                format!("sidecar names a different index: {}", sidecar.name),
            ));
        }
        if parse_blob_key(&sidecar.blob) != Some((name, sidecar.blob_checksum)) {
            return Err(VecdexError::corrupt(
                name,
                format!("sidecar names a foreign blob: {}", sidecar.blob),
            ));
        }

        let blob = match self.store.get(&sidecar.blob).await {
            Ok(b) => b,
            Err(VecdexError::NotFound { .. }) => {
                return Err(VecdexError::corrupt(
                    name,
                    format!("sidecar names missing blob {}", sidecar.blob),
                ))
            }
            Err(e) => return Err(e),
        };

        let actual = blob_checksum(&blob);
        if actual != sidecar.blob_checksum {
            return Err(VecdexError::corrupt(
                name,
                format!(
                    "blob checksum mismatch: sidecar has {}, blob is {actual}",
                    sidecar.blob_checksum
                ),
            ));
        }

        let handle = VectorIndexHandle::from_bytes(&blob)
            .map_err(|e| VecdexError::corrupt(name, format!("unreadable index blob: {e}")))?;

        if handle.dimension() != sidecar.dimension
            || handle.index_type() != sidecar.index_type
            || handle.vector_count() as u64 != sidecar.count
        {
            return Err(VecdexError::corrupt(
                name,
                format!(
                    "blob ({} dim {} count {}) disagrees with sidecar ({} dim {} count {})",
                    handle.index_type(),
                    handle.dimension(),
                    handle.vector_count(),
                    sidecar.index_type,
                    sidecar.dimension,
                    sidecar.count
                ),
            ));
        }

        let mut descriptor = sidecar.descriptor(name);
        descriptor.trained = handle.is_trained();
        let mut entry = IndexEntry::new(descriptor, handle, sidecar.metadata);
        entry.committed_blob = Some(sidecar.blob);
        Ok(entry)
    }

    /// Scan the store, group blobs and sidecars by name, and register every
    /// index whose sidecar names a sound blob. Blobs no sidecar names and
    /// unreadable pairs are reported in `LoadReport::failures` and left in
    /// place; they do not stop the others from loading.
    #[instrument(skip(self, registry))]
    pub async fn load_all(&self, registry: &IndexRegistry) -> Result<LoadReport> {
        let keys = self.store.list_keys().await?;

        let mut sidecars = BTreeSet::new();
        let mut blobs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in &keys {
            if let Some(name) = key.strip_suffix(SIDECAR_SUFFIX) {
                sidecars.insert(name.to_string());
            } else if let Some((name, _)) = parse_blob_key(key) {
                blobs.entry(name.to_string()).or_default().push(key.clone());
            } else {
                debug!(key = %key, "ignoring unrelated object");
            }
        }

        let names: BTreeSet<String> = sidecars.iter().chain(blobs.keys()).cloned().collect();

        let mut report = LoadReport::default();
        for name in names {
            let stored_blobs = blobs.remove(&name).unwrap_or_default();
            if !sidecars.contains(&name) {
                let err = VecdexError::corrupt(&name, "index blob has no sidecar");
                warn!(index = %name, error = %err, "failed to load index");
                report.failures.push((name, err));
                continue;
            }

            let loaded = match self.load(&name).await {
                Ok(entry) => registry.register(entry).await,
                Err(e) => Err(e),
            };
            match loaded {
                Ok(guard) => {
                    let vector_count = guard.descriptor.vector_count;
                    for key in stored_blobs
                        .iter()
                        .filter(|k| guard.committed_blob.as_deref() != Some(k.as_str()))
                    {
                        let err = VecdexError::corrupt(
                            &name,
                            format!("blob {key} is not named by the sidecar"),
                        );
                        warn!(index = %name, error = %err, "found uncommitted blob");
                        report.failures.push((name.clone(), err));
                    }
                    info!(index = %name, vector_count, "loaded index");
                    report.restored.push(RestoredIndex { name, vector_count });
                }
                Err(e) => {
                    warn!(index = %name, error = %e, "failed to load index");
                    report.failures.push((name, e));
                }
            }
        }

        Ok(report)
    }
}
