use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde_json::Value;

use super::{document_id, matches_field, merge, Document, DocumentStore};
use crate::errors::{StoreError, StoreResult};

/// Document store over Redis: one hash per collection, field = id, value = JSON.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        Ok(RedisStore {
            client,
            key_prefix: String::new(),
        })
    }

    /// Namespaces every collection key, e.g. `cfs:` gives `cfs:fileStorage`.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    async fn get_conn(&self) -> StoreResult<MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn key(&self, collection: &str) -> String {
        format!("{}{}", self.key_prefix, collection)
    }

    async fn put(&self, collection: &str, id: &str, record: &Document) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;
        let json = serde_json::to_string(record)?;
        let _: () = conn.hset(self.key(collection), id, json).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn add(&self, collection: &str, record: Document) -> StoreResult<String> {
        let id = document_id(&record);
        self.put(collection, &id, &record).await?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let mut conn = self.get_conn().await?;
        let data: Option<String> = conn.hget(self.key(collection), id).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        let mut conn = self.get_conn().await?;
        let values: Vec<String> = conn.hvals(self.key(collection)).await?;
        let mut hits = Vec::new();
        for json in values {
            let doc: Document = serde_json::from_str(&json)?;
            if matches_field(&doc, field, value) {
                hits.push(doc);
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
        self.put(collection, id, &record).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.hdel(self.key(collection), id).await?;
        Ok(())
    }
}
