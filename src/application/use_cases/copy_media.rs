use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::{ArchiveSink, MediaCollection};
use crate::application::report::ImportReport;

/// Use case: mirror media directories (post images, photo albums) into the archive
pub struct CopyMediaUseCase {
    collections: Vec<MediaCollection>,
    sink: Arc<dyn ArchiveSink>,
}

impl CopyMediaUseCase {
    pub fn new(collections: Vec<MediaCollection>, sink: Arc<dyn ArchiveSink>) -> Self {
        Self { collections, sink }
    }

    /// A collection that fails to copy is reported and the rest still run.
    ///
    /// Absent source directories are not errors; most archives only have some.
    pub async fn execute(&self) -> ImportReport {
        let mut report = ImportReport::new();

        for collection in &self.collections {
            match self.sink.copy_media(collection).await {
                Ok(Some(copied)) => report.media_files_copied += copied,
                Ok(None) => {
                    info!(source = %collection.source.display(), "No media to copy");
                }
                Err(e) => {
                    warn!(target = %collection.target, error = %e, "Media copy failed");
                    report.add_error(format!("media/{}: {}", collection.target, e));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockArchiveSink, StorageError};
    use std::path::PathBuf;

    fn collection(target: &str) -> MediaCollection {
        MediaCollection {
            source: PathBuf::from("input").join(target),
            target: target.to_string(),
            exclude: None,
        }
    }

    #[tokio::test]
    async fn test_counts_copies_and_tolerates_absent_sources() {
        let mut sink = MockArchiveSink::new();
        sink.expect_copy_media()
            .withf(|c| c.target == "mt")
            .times(1)
            .returning(|_| Ok(Some(4)));
        sink.expect_copy_media()
            .withf(|c| c.target == "lj")
            .times(1)
            .returning(|_| Ok(None));

        let use_case = CopyMediaUseCase::new(vec![collection("mt"), collection("lj")], Arc::new(sink));
        let report = use_case.execute().await;

        assert_eq!(report.media_files_copied, 4);
        assert!(report.is_success());
    }

    #[tokio::test]
    async fn test_failed_collection_does_not_stop_the_rest() {
        let mut sink = MockArchiveSink::new();
        sink.expect_copy_media()
            .withf(|c| c.target == "mt")
            .returning(|_| Err(StorageError::Internal("permission denied".to_string())));
        sink.expect_copy_media()
            .withf(|c| c.target == "lj")
            .returning(|_| Ok(Some(2)));

        let use_case = CopyMediaUseCase::new(vec![collection("mt"), collection("lj")], Arc::new(sink));
        let report = use_case.execute().await;

        assert_eq!(report.media_files_copied, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("media/mt: "));
    }
}
