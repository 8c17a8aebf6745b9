//! Link tables from desktop bookmark managers.
//!
//! The databases are proprietary; an external table reader exports each table
//! as `<db>/<table>.ndjson` ahead of the import. The databases never recorded
//! when a link was added, so every row takes the dump's modification time.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::common::{modified_time, normalize_or_skip, read_ndjson_rows};
use crate::application::errors::SourceError;
use crate::application::sources::{BookmarkSource, SourceBatch};
use crate::domain::entities::CanonicalBookmark;
use crate::domain::value_objects::SourceTag;

#[derive(Debug, Deserialize)]
struct LinkRow {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// One exported link table
pub struct DesktopDbSource {
    name: &'static str,
    tag: SourceTag,
    table_path: PathBuf,
    keep_summary: bool,
}

impl DesktopDbSource {
    /// predicate.net: `predicate/link.ndjson`, `url` and `title`
    pub fn predicate(root: &Path) -> Self {
        Self {
            name: "predicate",
            tag: SourceTag::PredicateNet,
            table_path: root.join("predicate").join("link.ndjson"),
            keep_summary: false,
        }
    }

    /// Havana: `havana/Link.ndjson`, `url`, `title` and `summary`
    pub fn havana(root: &Path) -> Self {
        Self {
            name: "havana",
            tag: SourceTag::Havana,
            table_path: root.join("havana").join("Link.ndjson"),
            keep_summary: true,
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }
}

#[async_trait]
impl BookmarkSource for DesktopDbSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let mut batch = SourceBatch::new();
        let rows: Vec<LinkRow> = read_ndjson_rows(&self.table_path, &mut batch).await?;
        let created = modified_time(&self.table_path).await;

        for row in rows {
            let Some(url) = normalize_or_skip(row.url.as_deref().unwrap_or_default(), self.name, &mut batch)
            else {
                continue;
            };
            let description = if self.keep_summary { row.summary } else { None };

            batch.push(
                CanonicalBookmark::new(url, self.tag)
                    .with_name(row.title)
                    .with_description(description)
                    .with_created(created),
            );
        }

        debug!(source = self.name, bookmarks = batch.len(), "Link table read");
        Ok(batch)
    }
}
