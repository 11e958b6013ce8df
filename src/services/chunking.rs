//! Path selection and chunk planning.

use std::ops::Range;

use crate::config::StorageLimits;
use crate::errors::{Result, StorageError};
use crate::utils::codec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPath {
    /// Whole file encoded inline in the descriptor.
    SingleRecord,
    /// File split across ordered chunk records.
    Chunked,
}

/// Picks the upload path for a file of `size` bytes, rejecting files over the cap.
pub fn classify(size: u64, limits: &StorageLimits) -> Result<UploadPath> {
    if size > limits.max_file_size {
        return Err(StorageError::Validation(format!(
            "file size {} bytes is too large, maximum size is {}MB",
            size,
            limits.max_file_size / (1024 * 1024)
        )));
    }
    if size <= limits.single_record_threshold {
        Ok(UploadPath::SingleRecord)
    } else {
        Ok(UploadPath::Chunked)
    }
}

/// Fixed-size partition of `size` bytes into `ceil(size / chunk_size)` slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    size: usize,
    chunk_size: usize,
}

impl ChunkPlan {
    pub fn new(size: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(StorageError::Validation("chunk size must be non-zero".to_string()));
        }
        Ok(Self { size, chunk_size })
    }

    pub fn count(&self) -> usize {
        self.size.div_ceil(self.chunk_size)
    }

    pub fn range(&self, index: usize) -> Range<usize> {
        let start = index * self.chunk_size;
        start..(start + self.chunk_size).min(self.size)
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count()).map(move |i| self.range(i))
    }

    /// Fails on the first chunk whose encoded form would exceed `limit`.
    pub fn verify(&self, limit: usize) -> Result<()> {
        for (index, range) in self.ranges().enumerate() {
            check_encoded(index, codec::encoded_len(range.len()), limit)?;
        }
        Ok(())
    }
}

pub fn check_encoded(index: usize, encoded_len: usize, limit: usize) -> Result<()> {
    if encoded_len > limit {
        return Err(StorageError::ChunkSizeExceeded {
            index,
            encoded_len,
            limit,
        });
    }
    Ok(())
}
