use log::warn;
use serde_json::Value;

use super::{from_document, to_document, DocumentStore};
use crate::errors::StoreResult;
use crate::models::file::FileRecord;

pub async fn create_file(store: &dyn DocumentStore, collection: &str, file: &FileRecord) -> StoreResult<String> {
    store.add(collection, to_document(file)?).await
}

pub async fn get_file_by_id(store: &dyn DocumentStore, collection: &str, file_id: &str) -> StoreResult<Option<FileRecord>> {
    match store.get(collection, file_id).await? {
        Some(doc) => Ok(Some(from_document(collection, doc)?)),
        None => Ok(None),
    }
}

/// Descriptors under `path_prefix`, newest first. Undecodable documents are skipped.
pub async fn list_files_by_prefix(store: &dyn DocumentStore, collection: &str, path_prefix: &str) -> StoreResult<Vec<FileRecord>> {
    let docs = store
        .query(collection, "pathPrefix", &Value::from(path_prefix))
        .await?;
    let mut records: Vec<FileRecord> = docs
        .into_iter()
        .filter_map(|doc| match from_document(collection, doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping descriptor: {}", e);
                None
            }
        })
        .collect();
    records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then_with(|| b.id.cmp(&a.id)));
    Ok(records)
}

pub async fn delete_file(store: &dyn DocumentStore, collection: &str, file_id: &str) -> StoreResult<()> {
    store.delete(collection, file_id).await
}
