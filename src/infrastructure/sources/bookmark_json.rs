//! Pinboard and Delicious JSON exports

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::common::{from_epoch_seconds, normalize_or_skip, parse_loose_datetime, read_json_rows};
use crate::application::errors::SourceError;
use crate::application::sources::{BookmarkSource, SourceBatch};
use crate::domain::entities::CanonicalBookmark;
use crate::domain::value_objects::SourceTag;

pub const PINBOARD_FILE: &str = "pinboard.json";
pub const DELICIOUS_FILE: &str = "delicious.json";

#[derive(Debug, Deserialize)]
struct PinboardRow {
    href: String,
    description: Option<String>,
    extended: Option<String>,
    time: String,
    /// Space separated
    tags: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeliciousRow {
    href: String,
    description: Option<String>,
    extended: Option<String>,
    /// Seconds since the epoch
    created: i64,
    #[serde(default)]
    tags: Vec<String>,
}

/// Pinboard `posts/all` JSON dump
pub struct PinboardSource {
    path: PathBuf,
}

impl PinboardSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BookmarkSource for PinboardSource {
    fn name(&self) -> &'static str {
        "pinboard"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Pinboard
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let mut batch = SourceBatch::new();
        let rows: Vec<PinboardRow> = read_json_rows(&self.path, &mut batch).await?;

        for row in rows {
            let Some(created) = parse_loose_datetime(&row.time) else {
                warn!(href = %row.href, time = %row.time, "Unreadable bookmark time");
                batch.reject();
                continue;
            };
            let Some(url) = normalize_or_skip(&row.href, self.name(), &mut batch) else {
                continue;
            };

            let tags: Vec<String> = row
                .tags
                .as_deref()
                .map(|t| t.to_lowercase().split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();

            batch.push(
                CanonicalBookmark::new(url, SourceTag::Pinboard)
                    .with_name(row.description)
                    .with_description(row.extended)
                    .with_created(Some(created))
                    .with_keywords(tags),
            );
        }

        debug!(bookmarks = batch.len(), "Pinboard export read");
        Ok(batch)
    }
}

/// Delicious JSON export
pub struct DeliciousSource {
    path: PathBuf,
}

impl DeliciousSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BookmarkSource for DeliciousSource {
    fn name(&self) -> &'static str {
        "delicious"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Delicious
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let mut batch = SourceBatch::new();
        let rows: Vec<DeliciousRow> = read_json_rows(&self.path, &mut batch).await?;

        for row in rows {
            let Some(url) = normalize_or_skip(&row.href, self.name(), &mut batch) else {
                continue;
            };
            batch.push(
                CanonicalBookmark::new(url, SourceTag::Delicious)
                    .with_name(row.description)
                    .with_description(row.extended)
                    .with_created(from_epoch_seconds(row.created))
                    .with_keywords(row.tags),
            );
        }

        debug!(bookmarks = batch.len(), "Delicious export read");
        Ok(batch)
    }
}
