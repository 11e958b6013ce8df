//! Chunked binary file storage over a document store with a per-record size ceiling.
//!
//! Files at or under the single-record threshold are stored inline, base64 encoded, in
//! one descriptor record. Larger files are split into fixed-size chunk records written
//! sequentially and reassembled on download.

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, StorageLimits};
pub use db::{DocumentStore, FsStore, MemoryStore, RedisStore};
pub use errors::{Result, StorageError, StoreError};
pub use models::{ChunkKey, ChunkRecord, FileRecord, NewFile, UploadProgress};
pub use services::{FileService, FileStorage, OrphanReport};
