//! Construction of index handles.

use tracing::{debug, info};

use crate::config::IndexingConfig;
use crate::error::Result;
use crate::index::flat::FlatIndex;
use crate::index::handle::VectorIndexHandle;
use crate::index::ivf_flat::kmeans::KMeansParams;
use crate::index::ivf_flat::IvfFlatIndex;
use crate::types::IndexType;

/// Builds handles of the requested variant using the indexing settings.
#[derive(Debug, Clone)]
pub struct IndexFactory {
    config: IndexingConfig,
}

impl IndexFactory {
    pub fn new(config: IndexingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    /// Create an empty handle.
    ///
    /// Approximate handles are trained on `sample` when one is given and left
    /// untrained otherwise. Exact handles ignore the sample.
    pub fn create(
        &self,
        index_type: IndexType,
        dimension: usize,
        sample: Option<&[Vec<f32>]>,
    ) -> Result<VectorIndexHandle> {
        let mut handle = match index_type {
            IndexType::Exact => VectorIndexHandle::Exact(FlatIndex::new(dimension)),
            IndexType::ApproximateClustered => VectorIndexHandle::ApproximateClustered(
                IvfFlatIndex::new(dimension, self.config.num_partitions),
            ),
        };

        match sample {
            Some(sample) if index_type.requires_training() => self.train(&mut handle, sample)?,
            Some(_) => debug!(%index_type, "ignoring training sample for exact index"),
            None => {}
        }

        Ok(handle)
    }

    /// Train `handle` on `sample` with the configured k-means parameters.
    pub fn train(&self, handle: &mut VectorIndexHandle, sample: &[Vec<f32>]) -> Result<()> {
        handle.train(sample, &KMeansParams::from_config(&self.config))?;
        if handle.index_type().requires_training() {
            info!(
                samples = sample.len(),
                partitions = self.config.num_partitions,
                "trained approximate index"
            );
        }
        Ok(())
    }
}
