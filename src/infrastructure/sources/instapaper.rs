//! Instapaper CSV export (`URL,Title,Selection,Folder,Timestamp`)

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::common::{from_epoch_seconds, normalize_or_skip, read_to_string};
use crate::application::errors::SourceError;
use crate::application::sources::{BookmarkSource, SourceBatch};
use crate::domain::entities::CanonicalBookmark;
use crate::domain::value_objects::SourceTag;

pub const INSTAPAPER_FILE: &str = "instapaper.csv";

#[derive(Debug, Deserialize)]
struct InstapaperRow {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<i64>,
}

pub struct InstapaperSource {
    path: PathBuf,
}

impl InstapaperSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse(&self, contents: &str) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(contents.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| SourceError::parse(&self.path, e))?;
        if !headers.iter().any(|h| h == "URL") {
            return Err(SourceError::parse(&self.path, "missing URL column"));
        }

        let mut batch = SourceBatch::new();
        for row in reader.deserialize::<InstapaperRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Skipping malformed row");
                    batch.reject();
                    continue;
                }
            };
            let Some(url) = normalize_or_skip(&row.url, self.name(), &mut batch) else {
                continue;
            };
            batch.push(
                CanonicalBookmark::new(url, SourceTag::Instapaper)
                    .with_name(row.title)
                    .with_created(row.timestamp.and_then(from_epoch_seconds)),
            );
        }
        Ok(batch)
    }
}

#[async_trait]
impl BookmarkSource for InstapaperSource {
    fn name(&self) -> &'static str {
        "instapaper"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Instapaper
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let contents = read_to_string(&self.path).await?;
        let batch = self.parse(&contents)?;
        debug!(bookmarks = batch.len(), "Instapaper export read");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rows_and_rejects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INSTAPAPER_FILE);
        std::fs::write(
            &path,
            "URL,Title,Selection,Folder,Timestamp\n\
             https://example.com/read,\"Long, read\",,Unread,1262304000\n\
             not a url,Broken,,Unread,1262304000\n\
             https://example.com/later,Later,,Archive,soon\n\
             https://example.com/undated,Undated,,Archive,\n",
        )
        .unwrap();

        let batch = InstapaperSource::new(path).collect().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.urls_skipped, 1);
        assert_eq!(batch.invalid, 1);

        let first = &batch.records[0];
        assert_eq!(first.name(), Some("Long, read"));
        assert_eq!(
            first.created(),
            Some(Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(batch.records[1].created().is_none());
    }

    #[tokio::test]
    async fn test_missing_url_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INSTAPAPER_FILE);
        std::fs::write(&path, "Link,Title\nhttps://example.com,x\n").unwrap();

        let result = InstapaperSource::new(path).collect().await;
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }
}
