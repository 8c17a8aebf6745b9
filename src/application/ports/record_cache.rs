use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable cache record {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Address of one cached record: `<partition>/<year>/<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub partition: String,
    pub year: i32,
    pub id: String,
}

impl CacheKey {
    pub fn new(partition: impl Into<String>, year: i32, id: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            year,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.partition, self.year, self.id)
    }
}

/// One record read back from the cache
pub type CachedRecord = Result<serde_json::Value, StorageError>;

/// Port for the intermediate cache of decoded-but-unprocessed records
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// True once any record exists in the partition.
    ///
    /// A filled partition means the fetch/decode stage for it can be skipped.
    async fn is_filled(&self, partition: &str) -> Result<bool, StorageError>;

    /// Store a record, replacing any previous one under the same key
    async fn put(&self, key: &CacheKey, record: &serde_json::Value) -> Result<(), StorageError>;

    /// Every record of a partition, ordered by year then id.
    ///
    /// Each record is read on its own, so one unreadable file yields one
    /// `Err` entry while the rest still load. The outer error is reserved for
    /// failing to list the partition at all.
    async fn load(&self, partition: &str) -> Result<Vec<CachedRecord>, StorageError>;
}
