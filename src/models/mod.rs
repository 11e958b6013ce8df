use serde::{Serialize, Deserialize};

pub mod file;
pub mod file_chunk;

pub use file::FileRecord;
pub use file_chunk::{ChunkKey, ChunkRecord};

/// Cumulative upload progress reported to callers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
    pub percentage: u8,
}

impl UploadProgress {
    /// Progress from cumulative bytes: `percentage` is `loaded / total` rounded.
    /// An empty file counts as complete.
    pub fn from_bytes(loaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((loaded.min(total) as f64 / total as f64) * 100.0).round() as u8
        };
        Self { loaded, total, percentage }
    }
}

/// A file handed to `upload_many`.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub data: bytes::Bytes,
}

impl NewFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<bytes::Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}
