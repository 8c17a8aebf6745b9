use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::ImportError;
use crate::application::ports::{CacheKey, RecordCache};
use crate::application::report::ImportReport;
use crate::application::sources::JournalSource;

/// Use case: decode raw journal sources into the record cache.
///
/// A source whose partition already holds records is skipped unless `force`
/// is set, so repeated runs never redo the expensive decode.
pub struct PopulateJournalCacheUseCase {
    cache: Arc<dyn RecordCache>,
    sources: Vec<Arc<dyn JournalSource>>,
}

impl PopulateJournalCacheUseCase {
    pub fn new(cache: Arc<dyn RecordCache>, sources: Vec<Arc<dyn JournalSource>>) -> Self {
        Self { cache, sources }
    }

    pub async fn execute(&self, force: bool) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::new();

        for source in &self.sources {
            let partition = source.partition();
            if !force && self.cache.is_filled(partition).await? {
                info!(source = source.name(), partition, "Cache already filled, skipping");
                report.sources_skipped += 1;
                continue;
            }

            let batch = match source.collect().await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Journal source failed");
                    report.add_error(format!("{}: {}", source.name(), e));
                    continue;
                }
            };

            report.decode_failures += batch.invalid;
            for record in &batch.records {
                let key = CacheKey::new(partition, record.year(), record.id().to_string());
                self.cache.put(&key, &record.to_value()?).await?;
                report.records_written += 1;
            }

            info!(
                source = source.name(),
                cached = batch.records.len(),
                failed = batch.invalid,
                "Journal source cached"
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::SourceError;
    use crate::application::ports::MockRecordCache;
    use crate::application::sources::{JournalRecord, MockJournalSource, SourceBatch};
    use crate::domain::entities::RawSemagicEntry;
    use chrono::{TimeZone, Utc};

    fn entry(id: u32) -> JournalRecord {
        JournalRecord::Semagic(RawSemagicEntry {
            id,
            subject: Some(format!("post {}", id)),
            date: Utc.with_ymd_and_hms(2004, 3, 1, 12, 0, 0).unwrap(),
            body: Some("body".to_string()),
            music: None,
            mood: None,
            avatar: None,
            flags: vec![0; 8],
        })
    }

    fn semagic_source() -> MockJournalSource {
        let mut source = MockJournalSource::new();
        source.expect_name().return_const("semagic");
        source
            .expect_partition()
            .return_const("livejournal/semagic");
        source
    }

    #[tokio::test]
    async fn test_filled_partition_is_skipped() {
        let mut cache = MockRecordCache::new();
        cache.expect_is_filled().times(1).returning(|_| Ok(true));
        cache.expect_put().times(0);

        let mut source = semagic_source();
        source.expect_collect().times(0);

        let use_case = PopulateJournalCacheUseCase::new(Arc::new(cache), vec![Arc::new(source)]);
        let report = use_case.execute(false).await.unwrap();

        assert_eq!(report.sources_skipped, 1);
        assert_eq!(report.records_written, 0);
    }

    #[tokio::test]
    async fn test_records_are_cached_by_year_and_id() {
        let mut cache = MockRecordCache::new();
        cache.expect_is_filled().returning(|_| Ok(false));
        cache
            .expect_put()
            .withf(|key, value| {
                key.partition == "livejournal/semagic"
                    && key.year == 2004
                    && value["id"].as_u64().map(|id| id.to_string()) == Some(key.id.clone())
            })
            .times(2)
            .returning(|_, _| Ok(()));

        let mut source = semagic_source();
        source.expect_collect().times(1).returning(|| {
            Ok(SourceBatch {
                records: vec![entry(1), entry(3)],
                urls_skipped: 0,
                invalid: 1,
            })
        });

        let use_case = PopulateJournalCacheUseCase::new(Arc::new(cache), vec![Arc::new(source)]);
        let report = use_case.execute(false).await.unwrap();

        assert_eq!(report.records_written, 2);
        assert_eq!(report.decode_failures, 1);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_force_ignores_filled_cache() {
        let mut cache = MockRecordCache::new();
        cache.expect_is_filled().times(0);
        cache.expect_put().times(1).returning(|_, _| Ok(()));

        let mut source = semagic_source();
        source
            .expect_collect()
            .returning(|| Ok(SourceBatch { records: vec![entry(9)], ..SourceBatch::default() }));

        let use_case = PopulateJournalCacheUseCase::new(Arc::new(cache), vec![Arc::new(source)]);
        let report = use_case.execute(true).await.unwrap();

        assert_eq!(report.records_written, 1);
        assert_eq!(report.sources_skipped, 0);
    }

    #[tokio::test]
    async fn test_failed_source_does_not_stop_the_run() {
        let mut cache = MockRecordCache::new();
        cache.expect_is_filled().returning(|_| Ok(false));
        cache.expect_put().times(1).returning(|_, _| Ok(()));

        let mut broken = MockJournalSource::new();
        broken.expect_name().return_const("livejournal-xml");
        broken.expect_partition().return_const("livejournal/xml");
        broken
            .expect_collect()
            .returning(|| Err(SourceError::parse("/in/export.xml", "unexpected end of file")));

        let mut working = semagic_source();
        working
            .expect_collect()
            .returning(|| Ok(SourceBatch { records: vec![entry(2)], ..SourceBatch::default() }));

        let use_case = PopulateJournalCacheUseCase::new(
            Arc::new(cache),
            vec![Arc::new(broken), Arc::new(working)],
        );
        let report = use_case.execute(false).await.unwrap();

        assert_eq!(report.records_written, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("livejournal-xml"));
    }
}
