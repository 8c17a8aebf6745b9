use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::livejournal_xml::XML_PARTITION;
use super::semagic_files::SEMAGIC_PARTITION;
use crate::application::errors::SourceError;
use crate::application::ports::RecordCache;
use crate::application::sources::{PostSource, SourceBatch};
use crate::domain::entities::{ArchivedPost, JournalEntry, RawSemagicEntry};

/// Turns cached LiveJournal records into archive posts.
///
/// Both partitions share LiveJournal's item ids. When an entry exists in both,
/// the XML export wins because it carries the comment thread.
pub struct LivejournalPostSource {
    cache: Arc<dyn RecordCache>,
}

impl LivejournalPostSource {
    pub fn new(cache: Arc<dyn RecordCache>) -> Self {
        Self { cache }
    }

    async fn load<T>(&self, partition: &str, batch: &mut SourceBatch<ArchivedPost>) -> Result<Vec<T>, SourceError>
    where
        T: DeserializeOwned,
    {
        let mut records = Vec::new();
        for cached in self.cache.load(partition).await? {
            let decoded = cached.and_then(|value| serde_json::from_value::<T>(value).map_err(Into::into));
            match decoded {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(partition, error = %e, "Skipping unreadable cache record");
                    batch.reject();
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl PostSource for LivejournalPostSource {
    fn name(&self) -> &'static str {
        "livejournal"
    }

    async fn collect(&self) -> Result<SourceBatch<ArchivedPost>, SourceError> {
        let mut batch = SourceBatch::new();
        let mut posts: BTreeMap<u32, ArchivedPost> = BTreeMap::new();

        for entry in self.load::<RawSemagicEntry>(SEMAGIC_PARTITION, &mut batch).await? {
            posts.insert(entry.id, entry.into());
        }
        for entry in self.load::<JournalEntry>(XML_PARTITION, &mut batch).await? {
            posts.insert(entry.id, entry.into());
        }

        batch.records = posts.into_values().collect();
        Ok(batch)
    }
}
