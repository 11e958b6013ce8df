use thiserror::Error;

/// Failures surfaced by a document-store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("record {id} is {size} bytes, store limit is {limit}")]
    RecordTooLarge { id: String, size: usize, limit: usize },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document that does not decode into the expected record type.
    #[error("malformed record {collection}/{id}: {reason}")]
    Malformed { collection: String, id: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures of the chunked file storage engine.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The file is rejected before any store call is made.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("chunk {} encodes to {encoded_len} bytes, exceeding the per-record limit of {limit}", .index + 1)]
    ChunkSizeExceeded {
        index: usize,
        encoded_len: usize,
        limit: usize,
    },

    #[error("failed to upload chunk {}/{total}: {source}", .index + 1)]
    ChunkUploadFailure {
        index: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    #[error("missing chunks: expected {expected}, found {found}")]
    ReassemblyIncomplete { expected: usize, found: usize },

    #[error("decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("reassembled {actual} bytes, descriptor declares {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for StorageError {
    fn from(e: StoreError) -> Self {
        if matches!(e, StoreError::Malformed { .. }) {
            return StorageError::InvalidRecord(e.to_string());
        }
        StorageError::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
