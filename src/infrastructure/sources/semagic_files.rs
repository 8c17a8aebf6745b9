use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::common::{files_with_extension, is_before};
use crate::application::batch::{BatchConfig, BatchProcessor, BatchTaskError};
use crate::application::errors::SourceError;
use crate::application::sources::{JournalRecord, JournalSource, SourceBatch};
use crate::decoding::semagic::SEMAGIC_EXTENSION;
use crate::decoding::{FileDecodeError, SemagicDecoder};

pub const SEMAGIC_PARTITION: &str = "livejournal/semagic";

#[derive(Debug, Error)]
enum SemagicFileError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] FileDecodeError),

    #[error(transparent)]
    Task(#[from] BatchTaskError),
}

/// Decodes every `.slj` file in a directory, several files at a time.
///
/// A file that cannot be read or decoded is logged with its path and counted;
/// the rest of the batch is unaffected.
pub struct SemagicFileSource {
    dir: PathBuf,
    decoder: SemagicDecoder,
    batch_config: BatchConfig,
    ignore_before: Option<NaiveDate>,
}

impl SemagicFileSource {
    pub fn new(dir: PathBuf, batch_config: BatchConfig) -> Self {
        Self {
            dir,
            decoder: SemagicDecoder::new(),
            batch_config,
            ignore_before: None,
        }
    }

    pub fn with_ignore_before(mut self, ignore_before: Option<NaiveDate>) -> Self {
        self.ignore_before = ignore_before;
        self
    }
}

#[async_trait]
impl JournalSource for SemagicFileSource {
    fn name(&self) -> &'static str {
        "semagic"
    }

    fn partition(&self) -> &'static str {
        SEMAGIC_PARTITION
    }

    async fn collect(&self) -> Result<SourceBatch<JournalRecord>, SourceError> {
        let files = files_with_extension(&self.dir, SEMAGIC_EXTENSION).await?;
        info!(count = files.len(), dir = %self.dir.display(), "Decoding semagic files");

        let decoder = self.decoder;
        let results = BatchProcessor::process_concurrent(files, &self.batch_config, move |path: PathBuf| async move {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| SemagicFileError::Read {
                    path: path.clone(),
                    source,
                })?;
            Ok::<_, SemagicFileError>(decoder.decode_file(&path, &bytes)?)
        })
        .await;

        let mut batch = SourceBatch::new();
        for result in results {
            let outcome = result
                .result
                .map_err(SemagicFileError::from)
                .and_then(|decoded| decoded);
            match outcome {
                Ok(entry) if is_before(entry.date, self.ignore_before) => {
                    debug!(id = entry.id, "Entry predates cutoff, dropped");
                }
                Ok(entry) => batch.push(JournalRecord::Semagic(entry)),
                Err(e) => {
                    warn!(path = %result.item.display(), error = %e, "Skipping semagic file");
                    batch.reject();
                }
            }
        }
        Ok(batch)
    }
}
