//! Document-store client seam and its adapters.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{StoreError, StoreResult};
use crate::utils::ids;

pub mod files;
pub mod file_chunks;
pub mod fs_store;
pub mod memory;
pub mod redis_store;

pub use fs_store::FsStore;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// One stored record: a JSON object.
pub type Document = Map<String, Value>;

/// Generic client for a networked document store.
///
/// `add` keys the record by its `id` string field when it has one. Deleting an
/// absent id succeeds.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn add(&self, collection: &str, record: Document) -> StoreResult<String>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Records whose `field` equals `value`.
    async fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>>;

    /// Merges `partial` into an existing record.
    async fn update(&self, collection: &str, id: &str, partial: Document) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// The key `add` stores `record` under.
pub(crate) fn document_id(record: &Document) -> String {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| ids::generate_file_id(Utc::now()))
}

pub(crate) fn matches_field(record: &Document, field: &str, value: &Value) -> bool {
    record.get(field) == Some(value)
}

pub(crate) fn merge(target: &mut Document, partial: Document) {
    for (k, v) in partial {
        target.insert(k, v);
    }
}

pub(crate) fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Decodes a stored document, reporting shape errors as `StoreError::Malformed`.
pub(crate) fn from_document<T: DeserializeOwned>(collection: &str, doc: Document) -> StoreResult<T> {
    let id = doc
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Malformed {
        collection: collection.to_string(),
        id,
        reason: e.to_string(),
    })
}
