use thiserror::Error;

#[derive(Error, Debug)]
pub enum VecdexError {
    // Registry errors
    #[error("index already exists: {name}")]
    DuplicateIndex { name: String },

    #[error("index not found: {name}")]
    IndexNotFound { name: String },

    #[error("unsupported index type: {token}")]
    UnsupportedIndexType { token: String },

    // Index errors
    #[error("index is not trained; train it with sample vectors first")]
    NotTrained,

    #[error("training requires at least {required} sample vectors, got {actual}")]
    InsufficientTrainingData { required: usize, actual: usize },

    // Validation errors
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("number of ids ({ids}) must match number of vectors ({vectors})")]
    IdCountMismatch { ids: usize, vectors: usize },

    #[error("number of metadata items ({metadata}) must match number of vectors ({vectors})")]
    MetadataCountMismatch { metadata: usize, vectors: usize },

    #[error("validation error: {0}")]
    Validation(String),

    // Durability errors
    #[error("failed to persist index {name}: {reason}")]
    PersistenceFailure { name: String, reason: String },

    #[error("corrupt persisted state for index {name}: {reason}")]
    CorruptPersistedState { name: String, reason: String },

    // Storage errors
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("storage path error: {0}")]
    StoragePath(#[from] object_store::path::Error),

    // Serialization errors
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode serialization error: {0}")]
    Bincode(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),

    // IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Box<bincode::ErrorKind>> for VecdexError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        VecdexError::Bincode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VecdexError>;

impl VecdexError {
    pub fn status_code(&self) -> u16 {
        match self {
            VecdexError::IndexNotFound { .. } | VecdexError::NotFound { .. } => 404,

            VecdexError::DuplicateIndex { .. } | VecdexError::NotTrained => 409,

            VecdexError::UnsupportedIndexType { .. }
            | VecdexError::InsufficientTrainingData { .. }
            | VecdexError::DimensionMismatch { .. }
            | VecdexError::IdCountMismatch { .. }
            | VecdexError::MetadataCountMismatch { .. }
            | VecdexError::Validation(_) => 400,

            _ => 500,
        }
    }

    /// Wrap a storage-level failure that happened while writing `name`.
    pub(crate) fn persistence(name: &str, err: VecdexError) -> Self {
        VecdexError::PersistenceFailure {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn corrupt(name: &str, reason: impl Into<String>) -> Self {
        VecdexError::CorruptPersistedState {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
