#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use chunked_file_storage::db::{Document, DocumentStore, MemoryStore};
use chunked_file_storage::errors::{StoreError, StoreResult};
use chunked_file_storage::services::FileService;
use chunked_file_storage::utils::throttle::Unthrottled;
use chunked_file_storage::StorageLimits;

pub const FILES: &str = "fileStorage";
pub const CHUNKS: &str = "fileChunks";
pub const KIB: usize = 1024;
pub const MIB: usize = 1024 * 1024;

/// Memory store that counts every call and can fail chosen writes.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    calls: AtomicUsize,
    failing_suffixes: Mutex<HashSet<String>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fails every `add` of a chunk record with this index.
    pub fn fail_chunk_writes_at(&self, index: usize) {
        self.failing_suffixes
            .lock()
            .unwrap()
            .insert(format!("_chunk_{}", index));
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn add(&self, collection: &str, record: Document) -> StoreResult<String> {
        self.tick();
        if let Some(id) = record.get("id").and_then(Value::as_str) {
            let failing = self.failing_suffixes.lock().unwrap();
            if failing.iter().any(|suffix| id.ends_with(suffix.as_str())) {
                return Err(StoreError::Backend("write rate exceeded".to_string()));
            }
        }
        self.inner.add(collection, record).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.tick();
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        self.tick();
        self.inner.query(collection, field, value).await
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> StoreResult<()> {
        self.tick();
        self.inner.update(collection, id, partial).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.tick();
        self.inner.delete(collection, id).await
    }
}

pub fn service(store: Arc<dyn DocumentStore>, limits: StorageLimits) -> FileService {
    FileService::new(store)
        .with_limits(limits)
        .with_throttle(Arc::new(Unthrottled))
}

/// Limits with the chunked path starting above `threshold` bytes.
pub fn limits_with_threshold(threshold: usize) -> StorageLimits {
    StorageLimits {
        single_record_threshold: threshold as u64,
        ..StorageLimits::default()
    }
}

/// Small limits so chunked uploads stay fast: 10-byte chunks above a 16-byte threshold.
pub fn tiny_limits() -> StorageLimits {
    StorageLimits {
        max_file_size: 4 * KIB as u64,
        single_record_threshold: 16,
        chunk_size: 10,
        max_record_size: 64,
    }
}

/// Bytes cycling through every value 0..=255.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}
