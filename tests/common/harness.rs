use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use vecdex::config::{IndexingConfig, LimitsConfig};
use vecdex::engine::SearchEngine;
use vecdex::persistence::{parse_blob_key, sidecar_key, Sidecar};
use vecdex::storage::VecdexStore;

/// An engine wired to a fresh store. Local harnesses keep their temp dir
/// alive for as long as the harness lives.
pub struct TestHarness {
    pub store: VecdexStore,
    pub engine: Arc<SearchEngine>,
    pub indexing: IndexingConfig,
    pub limits: LimitsConfig,
    dir: Option<TempDir>,
}

/// Indexing settings small enough for test-sized corpora.
pub fn test_indexing_config() -> IndexingConfig {
    IndexingConfig {
        num_partitions: 4,
        default_nprobe: 2,
        ..IndexingConfig::default()
    }
}

impl TestHarness {
    /// Engine over an in-memory store.
    pub async fn new() -> Self {
        Self::build(VecdexStore::in_memory(), None, test_indexing_config())
    }

    /// Engine over a local directory, so restarts read real files.
    pub async fn local() -> Self {
        Self::local_with(test_indexing_config()).await
    }

    pub async fn local_with(indexing: IndexingConfig) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = VecdexStore::local(dir.path()).expect("failed to open local store");
        Self::build(store, Some(dir), indexing)
    }

    fn build(store: VecdexStore, dir: Option<TempDir>, indexing: IndexingConfig) -> Self {
        let limits = LimitsConfig::default();
        let engine = Arc::new(SearchEngine::new(
            store.clone(),
            indexing.clone(),
            limits.clone(),
        ));
        Self {
            store,
            engine,
            indexing,
            limits,
            dir,
        }
    }

    /// The storage directory of a local harness.
    pub fn root(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.path().to_path_buf())
    }

    /// Simulate a process restart: a new engine with an empty registry over
    /// the same storage.
    pub fn restarted_engine(&self) -> SearchEngine {
        let store = match &self.dir {
            Some(dir) => VecdexStore::local(dir.path()).expect("failed to reopen local store"),
            None => self.store.clone(),
        };
        SearchEngine::new(store, self.indexing.clone(), self.limits.clone())
    }

    /// Every blob key stored for `name`, committed or not.
    pub async fn blob_keys(&self, name: &str) -> Vec<String> {
        self.store
            .list_keys()
            .await
            .expect("failed to list store")
            .into_iter()
            .filter(|k| matches!(parse_blob_key(k), Some((n, _)) if n == name))
            .collect()
    }

    /// The blob key named by the sidecar of `name`.
    pub async fn committed_blob(&self, name: &str) -> String {
        let raw = self
            .store
            .get(&sidecar_key(name))
            .await
            .expect("failed to read sidecar");
        Sidecar::from_bytes(&raw).expect("unreadable sidecar").blob
    }
}
