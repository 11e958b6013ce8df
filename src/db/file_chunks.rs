use log::warn;
use serde_json::Value;

use super::{from_document, to_document, DocumentStore};
use crate::errors::StoreResult;
use crate::models::file_chunk::{ChunkKey, ChunkRecord};

pub async fn create_file_chunk(store: &dyn DocumentStore, collection: &str, chunk: &ChunkRecord) -> StoreResult<String> {
    store.add(collection, to_document(chunk)?).await
}

pub async fn get_chunk(store: &dyn DocumentStore, collection: &str, key: &ChunkKey) -> StoreResult<Option<ChunkRecord>> {
    match store.get(collection, &key.record_id()).await? {
        Some(doc) => Ok(Some(from_document(collection, doc)?)),
        None => Ok(None),
    }
}

/// Chunk records under `path_prefix`. Undecodable documents are skipped.
pub async fn list_chunks_by_prefix(store: &dyn DocumentStore, collection: &str, path_prefix: &str) -> StoreResult<Vec<ChunkRecord>> {
    let docs = store
        .query(collection, "pathPrefix", &Value::from(path_prefix))
        .await?;
    let records = docs
        .into_iter()
        .filter_map(|doc| match from_document(collection, doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping chunk: {}", e);
                None
            }
        })
        .collect();
    Ok(records)
}

pub async fn delete_chunk(store: &dyn DocumentStore, collection: &str, key: &ChunkKey) -> StoreResult<()> {
    store.delete(collection, &key.record_id()).await
}
