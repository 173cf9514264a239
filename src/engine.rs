//! `SearchEngine`: the logical operations over named indexes.
//!
//! Every operation resolves its index through the registry, validates
//! against the descriptor, mutates the handle and metadata, and persists
//! before returning. The per-index lock is held across all of those steps.

use tracing::{debug, info, instrument};

use crate::config::{Config, IndexingConfig, LimitsConfig};
use crate::error::{Result, VecdexError};
use crate::index::IndexFactory;
use crate::metadata::MetadataStore;
use crate::metrics;
use crate::persistence::{LoadReport, PersistenceManager};
use crate::registry::{validate_index_name, IndexDescriptor, IndexEntry, IndexRegistry};
use crate::storage::VecdexStore;
use crate::types::{IndexType, Metadata, SearchResult, VectorId};

pub struct SearchEngine {
    registry: IndexRegistry,
    factory: IndexFactory,
    persistence: PersistenceManager,
    limits: LimitsConfig,
}

impl SearchEngine {
    pub fn new(store: VecdexStore, indexing: IndexingConfig, limits: LimitsConfig) -> Self {
        Self {
            registry: IndexRegistry::new(),
            factory: IndexFactory::new(indexing),
            persistence: PersistenceManager::new(store),
            limits,
        }
    }

    pub fn from_config(store: VecdexStore, config: &Config) -> Self {
        Self::new(store, config.indexing.clone(), config.limits.clone())
    }

    pub fn store(&self) -> &VecdexStore {
        self.persistence.store()
    }

    /// Restore every persisted index. Meant to run once, before serving.
    pub async fn load_all(&self) -> Result<LoadReport> {
        let report = self.persistence.load_all(&self.registry).await?;
        metrics::INDEXES_REGISTERED.set(self.registry.len() as i64);
        info!(
            restored = report.restored.len(),
            failed = report.failures.len(),
            "loaded persisted indexes"
        );
        Ok(report)
    }

    /// Create and persist an empty index. Approximate indexes start untrained.
    pub async fn create_index(
        &self,
        name: &str,
        dimension: usize,
        index_type: IndexType,
    ) -> Result<IndexDescriptor> {
        self.create_index_with_sample(name, dimension, index_type, None)
            .await
    }

    /// Create and persist an index, training it on `sample` when it is an
    /// approximate index.
    #[instrument(skip(self, sample), fields(index = name))]
    pub async fn create_index_with_sample(
        &self,
        name: &str,
        dimension: usize,
        index_type: IndexType,
        sample: Option<&[Vec<f32>]>,
    ) -> Result<IndexDescriptor> {
        let result = self
            .create_inner(name, dimension, index_type, sample)
            .await;
        metrics::record_operation("create_index", &result);
        result
    }

    async fn create_inner(
        &self,
        name: &str,
        dimension: usize,
        index_type: IndexType,
        sample: Option<&[Vec<f32>]>,
    ) -> Result<IndexDescriptor> {
        validate_index_name(name)?;
        if dimension == 0 || dimension > self.limits.max_dimension {
            return Err(VecdexError::Validation(format!(
                "dimension must be between 1 and {}",
                self.limits.max_dimension
            )));
        }
        // Checked again atomically by `register`; this just skips training.
        if self.registry.contains(name) {
            return Err(VecdexError::DuplicateIndex {
                name: name.to_string(),
            });
        }

        let handle = self.factory.create(index_type, dimension, sample)?;
        let descriptor = IndexDescriptor::new(name, dimension, index_type, handle.is_trained());
        let entry = IndexEntry::new(descriptor, handle, MetadataStore::new());

        let mut guard = self.registry.register(entry).await?;
        metrics::INDEXES_REGISTERED.inc();
        self.persistence.persist(&mut guard).await?;

        info!(%index_type, dimension, trained = guard.descriptor.trained, "created index");
        Ok(guard.descriptor.clone())
    }

    /// Train an approximate index on real sample vectors. Exact indexes need
    /// no training and are returned unchanged.
    #[instrument(skip(self, sample), fields(index = name, samples = sample.len()))]
    pub async fn train_index(&self, name: &str, sample: &[Vec<f32>]) -> Result<IndexDescriptor> {
        let result = self.train_inner(name, sample).await;
        metrics::record_operation("train_index", &result);
        result
    }

    async fn train_inner(&self, name: &str, sample: &[Vec<f32>]) -> Result<IndexDescriptor> {
        let mut guard = self.registry.write(name).await?;
        if !guard.descriptor.index_type.requires_training() {
            debug!("exact index needs no training");
            return Ok(guard.descriptor.clone());
        }

        self.factory.train(&mut guard.handle, sample)?;
        guard.descriptor.mark_trained();
        self.persistence.persist(&mut guard).await?;
        Ok(guard.descriptor.clone())
    }

    /// Append a batch of vectors and return the ids they were stored under.
    ///
    /// Without `ids`, consecutive ids starting at the current vector count
    /// are assigned. `metadata`, when given and non-empty, must have one
    /// element per vector; `None` elements attach nothing.
    #[instrument(skip(self, vectors, ids, metadata), fields(index = name, batch = vectors.len()))]
    pub async fn add_vectors(
        &self,
        name: &str,
        vectors: Vec<Vec<f32>>,
        ids: Option<Vec<VectorId>>,
        metadata: Option<Vec<Option<Metadata>>>,
    ) -> Result<Vec<VectorId>> {
        let result = self.add_inner(name, vectors, ids, metadata).await;
        metrics::record_operation("add_vectors", &result);
        result
    }

    async fn add_inner(
        &self,
        name: &str,
        vectors: Vec<Vec<f32>>,
        ids: Option<Vec<VectorId>>,
        metadata: Option<Vec<Option<Metadata>>>,
    ) -> Result<Vec<VectorId>> {
        if vectors.is_empty() {
            return Err(VecdexError::Validation(
                "batch must contain at least one vector".into(),
            ));
        }
        if vectors.len() > self.limits.max_batch_size {
            return Err(VecdexError::Validation(format!(
                "batch size {} exceeds maximum of {}",
                vectors.len(),
                self.limits.max_batch_size
            )));
        }

        let mut guard = self.registry.write(name).await?;
        let dimension = guard.descriptor.dimension;

        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(VecdexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let ids = match ids {
            Some(ids) => {
                if ids.len() != vectors.len() {
                    return Err(VecdexError::IdCountMismatch {
                        ids: ids.len(),
                        vectors: vectors.len(),
                    });
                }
                ids
            }
            None => {
                let start = guard.descriptor.vector_count as VectorId;
                (start..start + vectors.len() as VectorId).collect()
            }
        };

        let metadata = metadata.filter(|m| !m.is_empty());
        if let Some(items) = &metadata {
            if items.len() != vectors.len() {
                return Err(VecdexError::MetadataCountMismatch {
                    metadata: items.len(),
                    vectors: vectors.len(),
                });
            }
        }

        guard.handle.add(&vectors, &ids)?;

        if let Some(items) = metadata {
            for (id, item) in ids.iter().zip(items) {
                if let Some(object) = item {
                    guard.metadata.attach(*id, object);
                }
            }
        }
        guard.descriptor.record_added(vectors.len());

        self.persistence.persist(&mut guard).await?;

        metrics::VECTORS_ADDED_TOTAL
            .with_label_values(&[name])
            .inc_by(vectors.len() as u64);
        debug!(
            added = vectors.len(),
            vector_count = guard.descriptor.vector_count,
            "added vectors"
        );
        Ok(ids)
    }

    /// k-NN search using the configured default `nprobe`.
    pub async fn search(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.search_with_nprobe(name, query, k, None).await
    }

    /// k-NN search. `nprobe` only affects approximate indexes.
    #[instrument(skip(self, query), fields(index = name))]
    pub async fn search_with_nprobe(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
        nprobe: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let start = std::time::Instant::now();
        let result = self.search_inner(name, query, k, nprobe).await;
        metrics::record_operation("search", &result);
        if result.is_ok() {
            metrics::SEARCH_DURATION
                .with_label_values(&[name])
                .observe(start.elapsed().as_secs_f64());
        }
        result
    }

    async fn search_inner(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
        nprobe: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(VecdexError::Validation("k must be > 0".into()));
        }
        if k > self.limits.max_top_k {
            return Err(VecdexError::Validation(format!(
                "k {k} exceeds maximum of {}",
                self.limits.max_top_k
            )));
        }

        let guard = self.registry.read(name).await?;
        if query.len() != guard.descriptor.dimension {
            return Err(VecdexError::DimensionMismatch {
                expected: guard.descriptor.dimension,
                actual: query.len(),
            });
        }

        let nprobe = nprobe
            .unwrap_or(self.factory.config().default_nprobe)
            .max(1);
        let neighbors = guard.handle.search(query, k, nprobe)?;

        let results: Vec<SearchResult> = neighbors
            .into_iter()
            .map(|n| SearchResult {
                id: n.id,
                distance: n.distance,
                metadata: guard.metadata.lookup(n.id).cloned(),
            })
            .collect();
        debug!(returned = results.len(), "search complete");
        Ok(results)
    }

    /// Descriptor snapshots of every index, sorted by name.
    pub async fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.registry.list_all().await
    }

    pub async fn describe_index(&self, name: &str) -> Result<IndexDescriptor> {
        Ok(self.registry.read(name).await?.descriptor.clone())
    }

    /// Remove the index's durable files, then its registry entry.
    #[instrument(skip(self), fields(index = name))]
    pub async fn delete_index(&self, name: &str) -> Result<()> {
        let result = self.delete_inner(name).await;
        metrics::record_operation("delete_index", &result);
        result
    }

    async fn delete_inner(&self, name: &str) -> Result<()> {
        let mut guard = self.registry.write(name).await?;
        self.persistence.remove(name).await?;
        self.registry.remove(&mut guard)?;
        metrics::INDEXES_REGISTERED.dec();
        info!("deleted index");
        Ok(())
    }
}
