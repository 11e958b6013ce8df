use async_trait::async_trait;
use bytes::Bytes;
use log::error;

use crate::errors::Result;
use crate::models::{FileRecord, NewFile, UploadProgress};

pub mod chunking;
pub mod file_service;

pub use file_service::{FileService, OrphanReport};

pub type ProgressFn<'a> = &'a (dyn Fn(UploadProgress) + Send + Sync);
pub type BatchProgressFn<'a> = &'a (dyn Fn(usize, UploadProgress) + Send + Sync);

/// File-storage surface offered to the rest of an application.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Validates, stores and describes one file.
    async fn upload(
        &self,
        data: Bytes,
        name: &str,
        mime_type: &str,
        path_prefix: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<FileRecord>;

    /// Original bytes of a stored file.
    async fn download(&self, record: &FileRecord) -> Result<Vec<u8>>;

    /// A `data:` URL for the file. Chunked files are fully reassembled first.
    async fn resolve_access_reference(&self, record: &FileRecord) -> Result<String>;

    /// Removes the file's chunks and descriptor. Safe to repeat.
    async fn delete(&self, record: &FileRecord) -> Result<()>;

    /// Uploads each file independently; failures are logged and skipped.
    async fn upload_many(
        &self,
        files: Vec<NewFile>,
        path_prefix: &str,
        on_progress: Option<BatchProgressFn<'_>>,
    ) -> Vec<FileRecord> {
        let mut results = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            let per_file = move |progress: UploadProgress| {
                if let Some(cb) = on_progress {
                    cb(index, progress);
                }
            };
            match self
                .upload(file.data, &file.name, &file.mime_type, path_prefix, Some(&per_file))
                .await
            {
                Ok(record) => results.push(record),
                Err(e) => error!("Failed to upload {}: {}", file.name, e),
            }
        }
        results
    }
}
