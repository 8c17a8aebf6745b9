use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::ports::{CacheKey, CachedRecord, RecordCache, StorageError};
use crate::infrastructure::storage::{write_atomic, PathBuilder};

/// Record cache kept as one pretty-printed JSON file per record
pub struct JsonRecordCache {
    path_builder: PathBuilder,
    durable_writes: bool,
}

impl JsonRecordCache {
    pub fn new(path_builder: PathBuilder) -> Self {
        Self::with_durability(path_builder, false)
    }

    pub fn with_durability(path_builder: PathBuilder, durable_writes: bool) -> Self {
        Self {
            path_builder,
            durable_writes,
        }
    }

    /// `(year, id, path)` of every record in a partition, sorted by year then id
    async fn record_files(&self, partition: &str) -> Result<Vec<(i32, String, PathBuf)>, StorageError> {
        let root = self.path_builder.cache_partition(partition)?;
        let mut files = Vec::new();

        for year_dir in list_dir(&root).await? {
            let Some(year) = year_dir
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<i32>().ok())
            else {
                continue;
            };
            if !fs::metadata(&year_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
                continue;
            }

            for file in list_dir(&year_dir).await? {
                if file.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(id) = file.file_stem().and_then(|s| s.to_str()) {
                    files.push((year, id.to_string(), file.clone()));
                }
            }
        }

        files.sort_by(|a, b| {
            (a.0, a.1.parse::<u64>().ok(), &a.1).cmp(&(b.0, b.1.parse::<u64>().ok(), &b.1))
        });
        Ok(files)
    }
}

/// Entries of a directory; a missing directory is empty
async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    Ok(paths)
}

async fn read_record(path: &Path) -> CachedRecord {
    let unreadable = |reason: String| StorageError::Unreadable {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read(path).await.map_err(|e| unreadable(e.to_string()))?;
    serde_json::from_slice(&contents).map_err(|e| unreadable(e.to_string()))
}

#[async_trait]
impl RecordCache for JsonRecordCache {
    async fn is_filled(&self, partition: &str) -> Result<bool, StorageError> {
        Ok(!self.record_files(partition).await?.is_empty())
    }

    async fn put(&self, key: &CacheKey, record: &serde_json::Value) -> Result<(), StorageError> {
        let path = self.path_builder.cache_record(key)?;
        let contents = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &contents, self.durable_writes).await?;
        debug!("Cached {}", key);
        Ok(())
    }

    async fn load(&self, partition: &str) -> Result<Vec<CachedRecord>, StorageError> {
        let mut records = Vec::new();
        for (_, _, path) in self.record_files(partition).await? {
            let record = read_record(&path).await;
            if let Err(e) = &record {
                warn!(path = %path.display(), error = %e, "Unreadable cache record");
            }
            records.push(record);
        }
        Ok(records)
    }
}
