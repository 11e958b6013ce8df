use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::codec;

pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024; // 1GB
pub const SINGLE_RECORD_THRESHOLD: u64 = 8 * 1024 * 1024; // 8MB
pub const CHUNK_SIZE: usize = 750 * 1024; // ~1MB once base64 encoded
pub const MAX_RECORD_SIZE: usize = 1_048_487;
pub const CHUNK_WRITE_DELAY: Duration = Duration::from_millis(100);

/// Size constants that drive path selection and chunk planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLimits {
    pub max_file_size: u64,
    pub single_record_threshold: u64,
    pub chunk_size: usize,
    pub max_record_size: usize,
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            single_record_threshold: SINGLE_RECORD_THRESHOLD,
            chunk_size: CHUNK_SIZE,
            max_record_size: MAX_RECORD_SIZE,
        }
    }
}

impl StorageLimits {
    /// Rejects limits under which a full chunk could never be written.
    pub fn validated(self) -> Result<Self> {
        if self.chunk_size == 0 {
            return Err(anyhow!("chunk size must be non-zero"));
        }
        let encoded = codec::encoded_len(self.chunk_size);
        if encoded > self.max_record_size {
            return Err(anyhow!(
                "chunk size {} encodes to {} bytes, above the record limit {}",
                self.chunk_size,
                encoded,
                self.max_record_size
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Fs,
    Redis,
    Memory,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fs" => Ok(Backend::Fs),
            "redis" => Ok(Backend::Redis),
            "memory" => Ok(Backend::Memory),
            other => Err(anyhow!("unknown backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub redis_url: String,
    pub files_collection: String,
    pub chunks_collection: String,
    pub limits: StorageLimits,
    pub chunk_write_delay: Duration,
    pub orphan_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Fs,
            data_dir: PathBuf::from("./cfs-data"),
            redis_url: "redis://127.0.0.1/".to_string(),
            files_collection: "fileStorage".to_string(),
            chunks_collection: "fileChunks".to_string(),
            limits: StorageLimits::default(),
            chunk_write_delay: CHUNK_WRITE_DELAY,
            orphan_grace: Duration::from_secs(3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let limits = StorageLimits {
            max_file_size: parse_var("CFS_MAX_FILE_SIZE", defaults.limits.max_file_size)?,
            single_record_threshold: parse_var(
                "CFS_SINGLE_RECORD_THRESHOLD",
                defaults.limits.single_record_threshold,
            )?,
            chunk_size: parse_var("CFS_CHUNK_SIZE", defaults.limits.chunk_size)?,
            max_record_size: parse_var("CFS_MAX_RECORD_SIZE", defaults.limits.max_record_size)?,
        }
        .validated()?;

        Ok(Self {
            backend: parse_var("CFS_BACKEND", defaults.backend)?,
            data_dir: env::var("CFS_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            files_collection: env::var("CFS_FILES_COLLECTION").unwrap_or(defaults.files_collection),
            chunks_collection: env::var("CFS_CHUNKS_COLLECTION")
                .unwrap_or(defaults.chunks_collection),
            limits,
            chunk_write_delay: Duration::from_millis(parse_var(
                "CFS_CHUNK_DELAY_MS",
                defaults.chunk_write_delay.as_millis() as u64,
            )?),
            orphan_grace: Duration::from_secs(parse_var(
                "CFS_ORPHAN_GRACE_SECS",
                defaults.orphan_grace.as_secs(),
            )?),
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
