//! Layered configuration: defaults, then an optional TOML file, then
//! `VECDEX_*` environment variables.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Result, VecdexError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub indexing: IndexingConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request timeout applied by the HTTP layer.
    pub request_timeout_secs: u64,
    /// Upper bound on request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Which `object_store` backend holds the persisted indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Local,
    Memory,
    S3,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend.
    pub root: PathBuf,
    /// Bucket for the s3 backend.
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint (MinIO and friends).
    pub endpoint: Option<String>,
    /// Key prefix under which index files live.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            root: PathBuf::from("./data/indexes"),
            bucket: None,
            region: None,
            endpoint: None,
            prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Number of partitions in an approximate index.
    pub num_partitions: usize,
    /// Partitions scanned per approximate search unless the caller overrides it.
    pub default_nprobe: usize,
    pub kmeans_max_iterations: usize,
    pub kmeans_convergence_epsilon: f32,
    pub kmeans_seed: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            num_partitions: 100,
            default_nprobe: 8,
            kmeans_max_iterations: 25,
            kmeans_convergence_epsilon: 1e-4,
            kmeans_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_batch_size: usize,
    pub max_top_k: usize,
    pub max_dimension: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10_000,
            max_top_k: 1_000,
            max_dimension: 65_536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// `path` takes precedence over `VECDEX_CONFIG`. A missing explicit path is
    /// an error; with neither set, defaults are used. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = path
            .map(str::to_string)
            .or_else(|| std::env::var("VECDEX_CONFIG").ok());

        let mut config = match file {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)
                    .map_err(|e| VecdexError::Config(format!("failed to read {p}: {e}")))?;
                Self::from_toml(&raw)?
            }
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; unspecified fields keep their defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| VecdexError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("VECDEX_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env_parse("VECDEX_PORT")? {
            self.server.port = v;
        }
        if let Some(v) = env_parse("VECDEX_REQUEST_TIMEOUT_SECS")? {
            self.server.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("VECDEX_STORAGE_BACKEND") {
            self.storage.backend = match v.to_ascii_lowercase().as_str() {
                "local" => StorageBackend::Local,
                "memory" => StorageBackend::Memory,
                "s3" => StorageBackend::S3,
                other => {
                    return Err(VecdexError::Config(format!(
                        "unknown storage backend: {other}"
                    )))
                }
            };
        }
        if let Ok(v) = std::env::var("VECDEX_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VECDEX_S3_BUCKET") {
            self.storage.bucket = Some(v);
        }
        if let Ok(v) = std::env::var("VECDEX_S3_ENDPOINT") {
            self.storage.endpoint = Some(v);
        }
        if let Some(v) = env_parse("VECDEX_NUM_PARTITIONS")? {
            self.indexing.num_partitions = v;
        }
        if let Some(v) = env_parse("VECDEX_DEFAULT_NPROBE")? {
            self.indexing.default_nprobe = v;
        }
        if let Ok(v) = std::env::var("VECDEX_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("VECDEX_LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.indexing.num_partitions == 0 {
            return Err(VecdexError::Config(
                "indexing.num_partitions must be > 0".into(),
            ));
        }
        if self.indexing.default_nprobe == 0 {
            return Err(VecdexError::Config(
                "indexing.default_nprobe must be > 0".into(),
            ));
        }
        if self.limits.max_batch_size == 0 || self.limits.max_top_k == 0 {
            return Err(VecdexError::Config(
                "limits.max_batch_size and limits.max_top_k must be > 0".into(),
            ));
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.bucket.is_none() {
            return Err(VecdexError::Config(
                "storage.bucket is required for the s3 backend".into(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| VecdexError::Config(format!("invalid value for {key}: {raw}"))),
        Err(_) => Ok(None),
    }
}
