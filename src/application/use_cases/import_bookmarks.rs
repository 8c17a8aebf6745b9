use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::ImportError;
use crate::application::ports::ArchiveSink;
use crate::application::report::ImportReport;
use crate::application::sources::BookmarkSource;
use crate::domain::deduplicator::Deduplicator;
use crate::domain::value_objects::SourceTag;

/// Use case: merge every bookmark source into one deduplicated collection.
///
/// Sources run one at a time in `priority` order, and the first source to
/// produce a URL owns it. Sources whose tag is not in `priority` are not run.
pub struct ImportBookmarksUseCase {
    sources: Vec<Arc<dyn BookmarkSource>>,
    sink: Arc<dyn ArchiveSink>,
    priority: Vec<SourceTag>,
}

impl ImportBookmarksUseCase {
    pub fn new(
        sources: Vec<Arc<dyn BookmarkSource>>,
        sink: Arc<dyn ArchiveSink>,
        priority: Vec<SourceTag>,
    ) -> Self {
        Self {
            sources,
            sink,
            priority,
        }
    }

    /// Sources in the order they will run
    pub fn ordered_sources(&self) -> Vec<Arc<dyn BookmarkSource>> {
        for source in &self.sources {
            if !self.priority.contains(&source.tag()) {
                warn!(source = source.name(), tag = %source.tag(), "Source not in priority list, not run");
            }
        }

        self.priority
            .iter()
            .flat_map(|tag| self.sources.iter().filter(move |s| s.tag() == *tag))
            .cloned()
            .collect()
    }

    pub async fn execute(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::new();
        let mut deduplicator = Deduplicator::new();

        for source in self.ordered_sources() {
            let batch = match source.collect().await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Bookmark source failed");
                    report.add_error(format!("{}: {}", source.name(), e));
                    continue;
                }
            };
            report.urls_skipped += batch.urls_skipped;
            report.invalid_records += batch.invalid;

            let before = deduplicator.rejected();
            let mut accepted = 0;
            for bookmark in batch.records {
                match bookmark.validated() {
                    Ok(bookmark) => {
                        if deduplicator.insert(bookmark).is_accepted() {
                            accepted += 1;
                        }
                    }
                    Err(e) => {
                        warn!(source = source.name(), error = %e, "Invalid bookmark skipped");
                        report.invalid_records += 1;
                    }
                }
            }

            info!(
                source = source.name(),
                accepted,
                rejected = deduplicator.rejected() - before,
                urls_skipped = batch.urls_skipped,
                "Bookmark source merged"
            );
        }

        let result = deduplicator.finalize();
        self.sink.write_bookmarks(&result.records).await?;
        report.records_written = result.records.len();
        report.duplicates_rejected = result.rejected;

        Ok(report)
    }
}
