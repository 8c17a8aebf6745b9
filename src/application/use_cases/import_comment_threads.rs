use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::ImportError;
use crate::application::ports::ArchiveSink;
use crate::application::report::ImportReport;
use crate::application::sources::ThreadSource;

/// Use case: archive hosted comment threads next to the posts they belong to
pub struct ImportCommentThreadsUseCase {
    sources: Vec<Arc<dyn ThreadSource>>,
    sink: Arc<dyn ArchiveSink>,
}

impl ImportCommentThreadsUseCase {
    pub fn new(sources: Vec<Arc<dyn ThreadSource>>, sink: Arc<dyn ArchiveSink>) -> Self {
        Self { sources, sink }
    }

    pub async fn execute(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::new();

        for source in &self.sources {
            let batch = match source.collect().await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Thread source failed");
                    report.add_error(format!("{}: {}", source.name(), e));
                    continue;
                }
            };
            report.invalid_records += batch.invalid;

            for thread in &batch.records {
                self.sink.write_thread(thread).await?;
            }
            report.records_written += batch.len();
            info!(source = source.name(), threads = batch.len(), "Comment threads archived");
        }

        Ok(report)
    }
}
