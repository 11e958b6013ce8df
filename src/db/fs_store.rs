use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use tokio::fs;

use super::{document_id, matches_field, merge, Document, DocumentStore};
use crate::errors::{StoreError, StoreResult};

/// Document store on the local filesystem: `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> StoreResult<PathBuf> {
        check_segment(collection)?;
        Ok(self.root.join(collection))
    }

    fn record_path(&self, collection: &str, id: &str) -> StoreResult<PathBuf> {
        check_segment(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }

    async fn write_record(&self, collection: &str, id: &str, record: &Document) -> StoreResult<()> {
        let dir = self.collection_dir(collection)?;
        fs::create_dir_all(&dir).await?;
        let path = self.record_path(collection, id)?;
        let tmp = dir.join(format!(".{}.json.tmp", id));
        fs::write(&tmp, serde_json::to_vec(record)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read_record(path: &Path) -> StoreResult<Option<Document>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Collection names and ids become path segments; keep them inside the root.
fn check_segment(segment: &str) -> StoreResult<()> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.starts_with('.')
        || segment.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::Backend(format!("invalid key '{}'", segment)));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn add(&self, collection: &str, record: Document) -> StoreResult<String> {
        let id = document_id(&record);
        self.write_record(collection, &id, &record).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        Self::read_record(&self.record_path(collection, id)?).await
    }

    async fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        let dir = self.collection_dir(collection)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut hits = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(doc)) if matches_field(&doc, field, value) => hits.push(doc),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }
        Ok(hits)
    }

    async fn update(&self, collection: &str, id: &str, partial: Document) -> StoreResult<()> {
        let mut record = self.get(collection, id).await?.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;
        merge(&mut record, partial);
        self.write_record(collection, id, &record).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        match fs::remove_file(self.record_path(collection, id)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
