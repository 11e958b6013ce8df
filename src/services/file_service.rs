use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use log::{debug, error, info, warn};

use crate::config::{Config, StorageLimits, CHUNK_WRITE_DELAY};
use crate::db::{file_chunks, files, DocumentStore};
use crate::errors::{Result, StorageError, StoreError, StoreResult};
use crate::models::file::data_url;
use crate::models::{ChunkKey, ChunkRecord, FileRecord, UploadProgress};
use crate::services::chunking::{check_encoded, classify, ChunkPlan, UploadPath};
use crate::services::{FileStorage, ProgressFn};
use crate::utils::codec;
use crate::utils::ids;
use crate::utils::throttle::{RateLimiter, Throttle};

const FILES_UPLOADED: &str = "cfs_files_uploaded_total";
const FILES_DOWNLOADED: &str = "cfs_files_downloaded_total";
const FILES_DELETED: &str = "cfs_files_deleted_total";
const CHUNKS_WRITTEN: &str = "cfs_chunks_written_total";
const ORPHAN_CHUNKS_COLLECTED: &str = "cfs_orphan_chunks_collected_total";
const UPLOAD_SECONDS: &str = "cfs_upload_seconds";

/// Outcome of an orphaned-chunk sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrphanReport {
    /// Distinct file ids whose chunks were removed.
    pub files_removed: usize,
    pub chunks_removed: usize,
    /// File ids left alone because they are younger than the grace period.
    pub skipped_recent: usize,
}

/// Chunked file storage over a document store.
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn DocumentStore>,
    throttle: Arc<dyn Throttle>,
    limits: StorageLimits,
    files_collection: String,
    chunks_collection: String,
}

impl FileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let defaults = Config::default();
        FileService {
            store,
            throttle: Arc::new(RateLimiter::new(CHUNK_WRITE_DELAY)),
            limits: defaults.limits,
            files_collection: defaults.files_collection,
            chunks_collection: defaults.chunks_collection,
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, cfg: &Config) -> Self {
        Self::new(store)
            .with_limits(cfg.limits)
            .with_throttle(Arc::new(RateLimiter::new(cfg.chunk_write_delay)))
            .with_collections(&cfg.files_collection, &cfg.chunks_collection)
    }

    pub fn with_limits(mut self, limits: StorageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_collections(mut self, files: &str, chunks: &str) -> Self {
        self.files_collection = files.to_string();
        self.chunks_collection = chunks.to_string();
        self
    }

    pub fn limits(&self) -> &StorageLimits {
        &self.limits
    }

    /// Looks up a descriptor by file id.
    pub async fn find(&self, file_id: &str) -> Result<Option<FileRecord>> {
        Ok(files::get_file_by_id(self.store.as_ref(), &self.files_collection, file_id).await?)
    }

    pub async fn list(&self, path_prefix: &str) -> Result<Vec<FileRecord>> {
        Ok(files::list_files_by_prefix(self.store.as_ref(), &self.files_collection, path_prefix).await?)
    }

    /// Deletes chunk records under `path_prefix` that no committed descriptor owns.
    ///
    /// File ids created less than `grace` ago are skipped: their upload may still be running.
    pub async fn collect_orphans(&self, path_prefix: &str, grace: Duration) -> Result<OrphanReport> {
        let chunks = file_chunks::list_chunks_by_prefix(self.store.as_ref(), &self.chunks_collection, path_prefix).await?;

        let mut by_file: BTreeMap<String, Vec<ChunkKey>> = BTreeMap::new();
        for chunk in chunks {
            by_file.entry(chunk.file_id.clone()).or_default().push(chunk.key());
        }

        let cutoff = chrono::Duration::from_std(grace)
            .ok()
            .and_then(|g| Utc::now().checked_sub_signed(g));

        let mut report = OrphanReport::default();
        for (file_id, keys) in by_file {
            let old_enough = match (cutoff, ids::file_id_timestamp(&file_id)) {
                (Some(cutoff), Some(created)) => created <= cutoff,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !old_enough {
                report.skipped_recent += 1;
                continue;
            }
            if self.find(&file_id).await?.is_some() {
                continue;
            }

            for key in &keys {
                tolerate_missing(file_chunks::delete_chunk(self.store.as_ref(), &self.chunks_collection, key).await)?;
            }
            warn!("Removed {} orphaned chunks of aborted upload {}", keys.len(), file_id);
            report.files_removed += 1;
            report.chunks_removed += keys.len();
        }

        metrics::counter!(ORPHAN_CHUNKS_COLLECTED).increment(report.chunks_removed as u64);
        Ok(report)
    }

    async fn upload_single(
        &self,
        data: &Bytes,
        file: FileRecord,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<FileRecord> {
        let payload = codec::encode(data);
        let size = data.len() as u64;
        report(on_progress, UploadProgress { loaded: size, total: size, percentage: 50 });

        let record = FileRecord {
            chunked: false,
            chunk_count: None,
            inline_payload: Some(payload),
            ..file
        };
        files::create_file(self.store.as_ref(), &self.files_collection, &record).await?;

        report(on_progress, UploadProgress { loaded: size, total: size, percentage: 100 });
        Ok(record)
    }

    async fn upload_chunked(
        &self,
        data: &Bytes,
        file: FileRecord,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<FileRecord> {
        let plan = ChunkPlan::new(data.len(), self.limits.chunk_size)?;
        plan.verify(self.limits.max_record_size)?;
        let total = plan.count();
        let size = data.len() as u64;
        info!(
            "Uploading {} ({} bytes) in {} chunks of {} bytes",
            file.name, size, total, self.limits.chunk_size
        );

        for (index, range) in plan.ranges().enumerate() {
            let end = range.end as u64;
            let raw_len = range.len();
            let payload = codec::encode(&data[range]);
            check_encoded(index, payload.len(), self.limits.max_record_size)?;
            debug!(
                "Chunk {}/{}: {} bytes raw, {} bytes encoded ({}% of limit)",
                index + 1,
                total,
                raw_len,
                payload.len(),
                payload.len() * 100 / self.limits.max_record_size.max(1)
            );

            let key = ChunkKey::new(file.id.as_str(), index);
            let chunk = ChunkRecord::new(&key, total, payload, &file.path_prefix);
            {
                let _permit = self.throttle.acquire().await;
                file_chunks::create_file_chunk(self.store.as_ref(), &self.chunks_collection, &chunk)
                    .await
                    .map_err(|source| StorageError::ChunkUploadFailure { index, total, source })?;
            }
            metrics::counter!(CHUNKS_WRITTEN).increment(1);
            report(on_progress, UploadProgress::from_bytes(end, size));
        }

        let record = FileRecord {
            chunked: true,
            chunk_count: Some(total),
            inline_payload: None,
            ..file
        };
        files::create_file(self.store.as_ref(), &self.files_collection, &record).await?;
        Ok(record)
    }

    async fn reassemble(&self, record: &FileRecord, chunk_count: usize) -> Result<Vec<u8>> {
        let keys: Vec<ChunkKey> = ChunkKey::all(&record.id, chunk_count).collect();
        let fetches = keys.iter().map(|key| async move {
            file_chunks::get_chunk(self.store.as_ref(), &self.chunks_collection, key).await
        });
        let fetched = try_join_all(fetches).await?;

        let mut chunks: Vec<ChunkRecord> = Vec::with_capacity(fetched.len());
        for (key, chunk) in keys.iter().zip(fetched) {
            let Some(chunk) = chunk else { continue };
            if chunk.file_id != key.file_id || chunk.chunk_index != key.index {
                return Err(StorageError::InvalidRecord(format!(
                    "chunk record {} claims to be chunk {} of file {}",
                    key.record_id(),
                    chunk.chunk_index,
                    chunk.file_id
                )));
            }
            chunks.push(chunk);
        }
        chunks.sort_by_key(|c| c.chunk_index);

        if chunks.len() < chunk_count {
            return Err(StorageError::ReassemblyIncomplete {
                expected: chunk_count,
                found: chunks.len(),
            });
        }

        // Sized from the payloads; the descriptor's size is only checked afterwards.
        let capacity: usize = chunks.iter().map(|c| c.payload.len() / 4 * 3).sum();
        let mut data = Vec::with_capacity(capacity);
        for chunk in &chunks {
            data.extend_from_slice(&codec::decode(&chunk.payload)?);
        }
        Ok(data)
    }
}

fn report(on_progress: Option<ProgressFn<'_>>, progress: UploadProgress) {
    if let Some(cb) = on_progress {
        cb(progress);
    }
}

fn tolerate_missing(res: StoreResult<()>) -> StoreResult<()> {
    match res {
        Err(StoreError::NotFound { .. }) => Ok(()),
        other => other,
    }
}

#[async_trait]
impl FileStorage for FileService {
    async fn upload(
        &self,
        data: Bytes,
        name: &str,
        mime_type: &str,
        path_prefix: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<FileRecord> {
        let start_time = Instant::now();
        let route = classify(data.len() as u64, &self.limits)?;

        let now = Utc::now();
        let file_id = ids::generate_file_id(now);
        let file = FileRecord {
            path: ids::logical_path(path_prefix, &file_id, name),
            id: file_id,
            name: name.to_string(),
            size: data.len() as u64,
            mime_type: mime_type.to_string(),
            uploaded_at: now,
            path_prefix: path_prefix.to_string(),
            chunked: false,
            chunk_count: None,
            inline_payload: None,
        };

        let result = match route {
            UploadPath::SingleRecord => self.upload_single(&data, file, on_progress).await,
            UploadPath::Chunked => self.upload_chunked(&data, file, on_progress).await,
        };

        match &result {
            Ok(record) => {
                metrics::counter!(FILES_UPLOADED).increment(1);
                metrics::histogram!(UPLOAD_SECONDS).record(start_time.elapsed().as_secs_f64());
                info!(
                    "Uploaded {} as {} ({} bytes, {})",
                    record.name,
                    record.id,
                    record.size,
                    match record.chunk_count {
                        Some(n) => format!("{} chunks", n),
                        None => "inline".to_string(),
                    }
                );
            }
            Err(e) => error!("Upload of {} failed: {}", name, e),
        }
        result
    }

    async fn download(&self, record: &FileRecord) -> Result<Vec<u8>> {
        let data = if record.chunked {
            let chunk_count = record.chunk_count.ok_or_else(|| {
                StorageError::InvalidRecord(format!("chunked file {} has no chunk count", record.id))
            })?;
            self.reassemble(record, chunk_count).await?
        } else {
            let payload = record.inline_payload.as_deref().ok_or_else(|| {
                StorageError::InvalidRecord(format!("file {} has no inline payload", record.id))
            })?;
            codec::decode(payload)?
        };

        if data.len() as u64 != record.size {
            return Err(StorageError::SizeMismatch {
                expected: record.size,
                actual: data.len() as u64,
            });
        }
        metrics::counter!(FILES_DOWNLOADED).increment(1);
        Ok(data)
    }

    async fn resolve_access_reference(&self, record: &FileRecord) -> Result<String> {
        if let Some(url) = record.data_url() {
            return Ok(url);
        }
        if !record.chunked {
            return Err(StorageError::InvalidRecord(format!(
                "file {} has no inline payload",
                record.id
            )));
        }
        let data = self.download(record).await?;
        Ok(data_url(&record.mime_type, &codec::encode(&data)))
    }

    async fn delete(&self, record: &FileRecord) -> Result<()> {
        if let (true, Some(chunk_count)) = (record.chunked, record.chunk_count) {
            let deletes = ChunkKey::all(&record.id, chunk_count).map(|key| async move {
                tolerate_missing(file_chunks::delete_chunk(self.store.as_ref(), &self.chunks_collection, &key).await)
            });
            try_join_all(deletes).await?;
        }
        tolerate_missing(files::delete_file(self.store.as_ref(), &self.files_collection, &record.id).await)?;

        metrics::counter!(FILES_DELETED).increment(1);
        info!("Deleted {} ({})", record.name, record.id);
        Ok(())
    }
}
