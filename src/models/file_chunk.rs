use serde::{Serialize, Deserialize};

/// Identity of one chunk: owning file plus 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub file_id: String,
    pub index: usize,
}

impl ChunkKey {
    pub fn new(file_id: impl Into<String>, index: usize) -> Self {
        Self { file_id: file_id.into(), index }
    }

    /// Store id shared by the write and read paths.
    pub fn record_id(&self) -> String {
        format!("{}_chunk_{}", self.file_id, self.index)
    }

    /// Keys for every chunk of a file with `count` chunks.
    pub fn all(file_id: &str, count: usize) -> impl Iterator<Item = ChunkKey> + '_ {
        (0..count).map(move |index| ChunkKey::new(file_id, index))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    pub id: String,
    pub file_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub payload: String,
    pub path_prefix: String,
}

impl ChunkRecord {
    pub fn new(key: &ChunkKey, total_chunks: usize, payload: String, path_prefix: &str) -> Self {
        Self {
            id: key.record_id(),
            file_id: key.file_id.clone(),
            chunk_index: key.index,
            total_chunks,
            payload,
            path_prefix: path_prefix.to_string(),
        }
    }

    pub fn key(&self) -> ChunkKey {
        ChunkKey::new(self.file_id.clone(), self.chunk_index)
    }
}
