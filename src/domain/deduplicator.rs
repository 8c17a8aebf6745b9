//! First-write-wins aggregation of bookmarks keyed by [`BookmarkId`].
//!
//! The first bookmark inserted under an identifier is kept and every later one
//! is rejected, however much richer its metadata. Which source wins a shared
//! URL is therefore decided by the order sources are fed in, and that order is
//! configuration (see `Config::bookmark_sources`).

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::entities::CanonicalBookmark;
use crate::domain::value_objects::BookmarkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Accepted,
    /// Index of the record that already holds the identifier
    Rejected { existing: usize },
}

impl InsertOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, InsertOutcome::Accepted)
    }
}

/// Records in first-insertion order plus the number of rejected duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicated {
    pub records: Vec<CanonicalBookmark>,
    pub rejected: usize,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    records: Vec<CanonicalBookmark>,
    index: HashMap<BookmarkId, usize>,
    rejected: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bookmark: CanonicalBookmark) -> InsertOutcome {
        if let Some(&existing) = self.index.get(bookmark.identifier()) {
            self.rejected += 1;
            debug!(
                "Rejected {}: {}",
                bookmark.part_of(),
                bookmark.shared_content()
            );
            return InsertOutcome::Rejected { existing };
        }

        self.index
            .insert(bookmark.identifier().clone(), self.records.len());
        self.records.push(bookmark);
        InsertOutcome::Accepted
    }

    pub fn extend(&mut self, bookmarks: impl IntoIterator<Item = CanonicalBookmark>) -> usize {
        let mut accepted = 0;
        for bookmark in bookmarks {
            if self.insert(bookmark).is_accepted() {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn contains(&self, identifier: &BookmarkId) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn get(&self, identifier: &BookmarkId) -> Option<&CanonicalBookmark> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn finalize(self) -> Deduplicated {
        Deduplicated {
            records: self.records,
            rejected: self.rejected,
        }
    }
}

/// [`Deduplicator`] behind a lock, for sources collected on several tasks.
///
/// Every insert is serialised. First-write-wins then holds for whatever order
/// the inserts reach the lock, so callers that need reproducible output must
/// still feed sources in priority order.
#[derive(Debug, Default)]
pub struct SharedDeduplicator {
    inner: Mutex<Deduplicator>,
}

impl SharedDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bookmark: CanonicalBookmark) -> InsertOutcome {
        self.inner.lock().insert(bookmark)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.inner.lock().rejected()
    }

    pub fn finalize(self) -> Deduplicated {
        self.inner.into_inner().finalize()
    }
}
