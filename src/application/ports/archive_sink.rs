use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use regex::RegexSet;

use super::StorageError;
use crate::domain::entities::{ArchivedPost, CanonicalBookmark, CommentThread};

/// A directory of media files mirrored into the archive
#[derive(Debug, Clone)]
pub struct MediaCollection {
    pub source: PathBuf,
    /// Directory under `<output>/media`
    pub target: String,
    /// Paths relative to `source` matching any of these are left behind
    pub exclude: Option<RegexSet>,
}

impl MediaCollection {
    pub fn excludes(&self, relative: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(relative))
    }
}

/// Port for the final file-based archive
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Write one post (and its comments, if any)
    async fn write_post(&self, post: &ArchivedPost) -> Result<(), StorageError>;

    /// Write a hosted comment thread next to the post comments
    async fn write_thread(&self, thread: &CommentThread) -> Result<(), StorageError>;

    /// Write the deduplicated bookmark collection, replacing any earlier one
    async fn write_bookmarks(&self, bookmarks: &[CanonicalBookmark]) -> Result<(), StorageError>;

    /// Copy a media collection; `None` when its source directory does not exist
    async fn copy_media(&self, collection: &MediaCollection) -> Result<Option<usize>, StorageError>;
}
