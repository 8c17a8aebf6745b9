//! Traits every source adapter implements.
//!
//! Adapters receive their configuration at construction and never read the
//! environment. A source returns `Err` only when it cannot be read at all; bad
//! rows are skipped, logged and counted in the returned [`SourceBatch`].

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::application::errors::SourceError;
use crate::domain::entities::{
    ArchivedPost, CanonicalBookmark, CommentThread, JournalEntry, RawSemagicEntry,
};
use crate::domain::value_objects::SourceTag;

/// Records produced by one source run plus what was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBatch<T> {
    pub records: Vec<T>,
    /// Rows dropped because their URL did not normalise
    pub urls_skipped: usize,
    /// Rows dropped because they could not be decoded or were malformed
    pub invalid: usize,
}

impl<T> Default for SourceBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            urls_skipped: 0,
            invalid: 0,
        }
    }
}

impl<T> SourceBatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn skip_url(&mut self) {
        self.urls_skipped += 1;
    }

    pub fn reject(&mut self) {
        self.invalid += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A LiveJournal record as it is stored in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    Semagic(RawSemagicEntry),
    Export(JournalEntry),
}

impl JournalRecord {
    pub fn id(&self) -> u32 {
        match self {
            JournalRecord::Semagic(entry) => entry.id,
            JournalRecord::Export(entry) => entry.id,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            JournalRecord::Semagic(entry) => entry.year(),
            JournalRecord::Export(entry) => entry.year(),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            JournalRecord::Semagic(entry) => serde_json::to_value(entry),
            JournalRecord::Export(entry) => serde_json::to_value(entry),
        }
    }
}

/// Produces raw journal records for the cache-fill stage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JournalSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cache partition the records are stored under
    fn partition(&self) -> &'static str;

    async fn collect(&self) -> Result<SourceBatch<JournalRecord>, SourceError>;
}

/// Produces blog posts for the archive
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PostSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect(&self) -> Result<SourceBatch<ArchivedPost>, SourceError>;
}

/// Produces canonical bookmarks for the aggregator
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookmarkSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tag written to `partOf`, also used to place the source in the priority list
    fn tag(&self) -> SourceTag;

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError>;
}

/// Produces hosted comment threads for the archive
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ThreadSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect(&self) -> Result<SourceBatch<CommentThread>, SourceError>;
}
