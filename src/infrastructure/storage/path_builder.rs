use std::path::{Component, Path, PathBuf};

use crate::application::ports::{CacheKey, StorageError};

/// Utility for generating cache and archive paths
#[derive(Debug, Clone)]
pub struct PathBuilder {
    cache_root: PathBuf,
    output_root: PathBuf,
}

impl PathBuilder {
    pub fn new(cache_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            cache_root,
            output_root,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Cache partition directory: /cache/{partition}
    pub fn cache_partition(&self, partition: &str) -> Result<PathBuf, StorageError> {
        ensure_relative(partition)?;
        Ok(self.cache_root.join(partition))
    }

    /// Cached record: /cache/{partition}/{year}/{id}.json
    pub fn cache_record(&self, key: &CacheKey) -> Result<PathBuf, StorageError> {
        ensure_file_name(&key.id)?;
        Ok(self
            .cache_partition(&key.partition)?
            .join(key.year.to_string())
            .join(format!("{}.json", key.id)))
    }

    /// Archived post: /output/content/{year}/{id}.md
    pub fn post(&self, year: i32, id: &str) -> Result<PathBuf, StorageError> {
        ensure_file_name(id)?;
        Ok(self
            .output_root
            .join("content")
            .join(year.to_string())
            .join(format!("{}.md", id)))
    }

    /// Comment thread of a post: /output/comments/{id}.json
    pub fn comments(&self, id: &str) -> Result<PathBuf, StorageError> {
        ensure_file_name(id)?;
        Ok(self
            .output_root
            .join("comments")
            .join(format!("{}.json", id)))
    }

    /// Media collection directory: /output/media/{target}
    pub fn media(&self, target: &str) -> Result<PathBuf, StorageError> {
        ensure_relative(target)?;
        Ok(self.output_root.join("media").join(target))
    }

    pub fn bookmarks_ndjson(&self) -> PathBuf {
        self.output_root.join("bookmarks.ndjson")
    }

    pub fn bookmarks_csv(&self) -> PathBuf {
        self.output_root.join("bookmarks.csv")
    }

    /// Sibling temp file a write goes to before it is renamed into place
    pub fn temp_for(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

fn ensure_relative(partition: &str) -> Result<(), StorageError> {
    let path = Path::new(partition);
    let valid = !partition.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(partition.to_string()))
    }
}

fn ensure_file_name(id: &str) -> Result<(), StorageError> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(StorageError::InvalidKey(id.to_string()));
    }
    Ok(())
}
