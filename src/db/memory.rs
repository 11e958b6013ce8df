use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{document_id, matches_field, merge, Document, DocumentStore};
use crate::errors::{StoreError, StoreResult};

/// In-process document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
    record_limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects records whose serialized size exceeds `limit` bytes.
    pub fn with_record_limit(limit: usize) -> Self {
        Self {
            record_limit: Some(limit),
            ..Self::default()
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    /// Ids stored in `collection`, in key order.
    pub async fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn check_size(&self, id: &str, record: &Document) -> StoreResult<()> {
        if let Some(limit) = self.record_limit {
            let size = serde_json::to_vec(record)?.len();
            if size > limit {
                return Err(StoreError::RecordTooLarge {
                    id: id.to_string(),
                    size,
                    limit,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, record: Document) -> StoreResult<String> {
        let id = document_id(&record);
        self.check_size(&id, &record)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| matches_field(doc, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> StoreResult<()> {
        let mut guard = self.collections.write().await;
        let record = guard
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        let mut updated = record.clone();
        merge(&mut updated, partial);
        self.check_size(id, &updated)?;
        *record = updated;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(c) = self.collections.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }
}
