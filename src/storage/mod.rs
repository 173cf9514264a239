//! Object storage wrapper shared by the persistence layer.
//!
//! All index files go through `VecdexStore`, which hides the concrete
//! `object_store` backend (local filesystem, in-memory, or S3).
//!
//! `put` replaces the whole object or nothing: the local backend writes to a
//! staging file and renames it into place, and object stores never expose a
//! partially uploaded object.

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore;
use tracing::{debug, info, instrument};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Result, VecdexError};

#[derive(Clone)]
pub struct VecdexStore {
    inner: Arc<dyn ObjectStore>,
    prefix: String,
}

impl std::fmt::Debug for VecdexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VecdexStore")
            .field("backend", &self.inner.to_string())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl VecdexStore {
    pub fn new(inner: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        Self { inner, prefix }
    }

    /// Build a store from the storage section of the config.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let inner: Arc<dyn ObjectStore> = match config.backend {
            StorageBackend::Local => {
                std::fs::create_dir_all(&config.root)?;
                info!(root = %config.root.display(), "using local storage backend");
                Arc::new(LocalFileSystem::new_with_prefix(&config.root)?)
            }
            StorageBackend::Memory => {
                info!("using in-memory storage backend");
                Arc::new(InMemory::new())
            }
            StorageBackend::S3 => {
                let bucket = config.bucket.as_deref().ok_or_else(|| {
                    VecdexError::Config("storage.bucket is required for the s3 backend".into())
                })?;
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = &config.region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }
                info!(bucket, "using s3 storage backend");
                Arc::new(builder.build()?)
            }
        };
        Ok(Self::new(inner, config.prefix.clone()))
    }

    /// An empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "")
    }

    /// A store rooted at a local directory, created if missing.
    pub fn local(root: impl AsRef<std::path::Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        Ok(Self::new(
            Arc::new(LocalFileSystem::new_with_prefix(root.as_ref())?),
            "",
        ))
    }

    fn path(&self, key: &str) -> Path {
        if self.prefix.is_empty() {
            Path::from(key)
        } else {
            Path::from(format!("{}/{key}", self.prefix))
        }
    }

    /// Strip the store prefix from a listed location.
    fn relative_key(&self, location: &Path) -> String {
        let full = location.as_ref();
        if self.prefix.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(&self.prefix)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .unwrap_or_else(|| full.to_string())
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.inner.put(&self.path(key), data.into()).await?;
        debug!("put object");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        match self.inner.get(&self.path(key)).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => Err(VecdexError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.inner.head(&self.path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object. Deleting a missing object is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.inner.delete(&self.path(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List all keys (relative to the store prefix) in the store.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let root = if self.prefix.is_empty() {
            None
        } else {
            Some(Path::from(self.prefix.as_str()))
        };
        let metas: Vec<_> = self.inner.list(root.as_ref()).try_collect().await?;
        let mut keys: Vec<String> = metas
            .iter()
            .map(|m| self.relative_key(&m.location))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
