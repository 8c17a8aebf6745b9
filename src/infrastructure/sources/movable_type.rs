//! Movable Type table dumps (`entries.json`, `plugin-data.json`), each a JSON
//! array of rows exported from the blog database.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::common::{normalize_or_skip, parse_loose_datetime, read_json_rows};
use crate::application::errors::SourceError;
use crate::application::sources::{BookmarkSource, PostSource, SourceBatch};
use crate::config::MovableTypeConfig;
use crate::domain::entities::{ArchivedPost, CanonicalBookmark, PostDates};
use crate::domain::markup::BodyFormat;
use crate::domain::value_objects::SourceTag;

const ENTRIES_FILE: &str = "entries.json";
const PLUGIN_DATA_FILE: &str = "plugin-data.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRow {
    id: i64,
    blog_id: i64,
    author_id: i64,
    title: Option<String>,
    format: Option<String>,
    excerpt: Option<String>,
    text: Option<String>,
    keywords: Option<String>,
    more: Option<String>,
    basename: Option<String>,
    created: Option<String>,
    modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PluginDataRow {
    plugin: String,
    #[serde(default)]
    key: Option<String>,
    data: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Blog entries from the `mt_entry` dump
pub struct MovableTypeSource {
    dir: PathBuf,
    config: MovableTypeConfig,
}

impl MovableTypeSource {
    pub fn new(dir: PathBuf, config: MovableTypeConfig) -> Self {
        Self { dir, config }
    }

    fn wanted(&self, row: &EntryRow) -> bool {
        (self.config.user_list.is_empty() || self.config.user_list.contains(&row.author_id))
            && (self.config.blog_list.is_empty() || self.config.blog_list.contains(&row.blog_id))
    }

    fn to_post(row: EntryRow) -> Option<ArchivedPost> {
        let mut body = row.text.clone()?;
        let mut summary = non_blank(&row.excerpt).map(str::to_string);

        if let Some(more) = non_blank(&row.more) {
            if summary.is_none() {
                summary = Some(body.clone());
            }
            body.push_str(more);
        }

        let created = row.created.as_deref().and_then(parse_loose_datetime)?;
        let tags = row
            .keywords
            .as_deref()
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(ArchivedPost {
            id: format!("mt-{}", row.id),
            source: SourceTag::MovableType,
            name: non_blank(&row.title).map(str::to_string),
            slug: non_blank(&row.basename).map(str::to_string),
            description: summary,
            date: PostDates {
                created,
                modified: row.modified.as_deref().and_then(parse_loose_datetime),
            },
            tags,
            mood: None,
            music: None,
            avatar: None,
            blog: Some(format!("mt-{}", row.blog_id)),
            format: BodyFormat::from_movable_type(row.format.as_deref()),
            body,
            comments: Vec::new(),
        })
    }
}

#[async_trait]
impl PostSource for MovableTypeSource {
    fn name(&self) -> &'static str {
        "movabletype"
    }

    async fn collect(&self) -> Result<SourceBatch<ArchivedPost>, SourceError> {
        let mut batch = SourceBatch::new();
        let rows: Vec<EntryRow> = read_json_rows(&self.dir.join(ENTRIES_FILE), &mut batch).await?;

        for row in rows {
            if !self.wanted(&row) {
                continue;
            }
            if row.text.is_none() {
                debug!(id = row.id, "Entry has no text, skipped");
                continue;
            }
            let id = row.id;
            match Self::to_post(row) {
                Some(post) => batch.push(post),
                None => {
                    warn!(id, "Entry has no usable creation date");
                    batch.reject();
                }
            }
        }

        info!(posts = batch.len(), "Movable Type entries read");
        Ok(batch)
    }
}

/// Blogroll links stored by a plugin as one delimiter-encoded blob per row.
///
/// A blob holds records split by `record_delimiter`, each record holding
/// `url`, `name` and `description` split by `field_delimiter`.
pub struct MovableTypeBlogrollSource {
    dir: PathBuf,
    plugin: String,
    record_delimiter: String,
    field_delimiter: String,
}

impl MovableTypeBlogrollSource {
    pub fn new(dir: PathBuf, config: &MovableTypeConfig) -> Self {
        Self {
            dir,
            plugin: config.blogroll_plugin.clone(),
            record_delimiter: config.record_delimiter.clone(),
            field_delimiter: config.field_delimiter.clone(),
        }
    }

    fn decode_blob(&self, blob: &str, batch: &mut SourceBatch<CanonicalBookmark>) {
        for record in blob.split(self.record_delimiter.as_str()) {
            let record = record.trim_matches(['\r', '\n']);
            if record.trim().is_empty() {
                continue;
            }

            let mut fields = record.splitn(3, self.field_delimiter.as_str()).map(str::trim);
            let url = fields.next().unwrap_or_default();
            let name = fields.next().filter(|n| !n.is_empty()).map(str::to_string);
            let description = fields.next().filter(|d| !d.is_empty()).map(str::to_string);

            if let Some(normalized) = normalize_or_skip(url, self.name(), batch) {
                batch.push(
                    CanonicalBookmark::new(normalized, SourceTag::MovableType)
                        .with_name(name)
                        .with_description(description),
                );
            }
        }
    }
}

#[async_trait]
impl BookmarkSource for MovableTypeBlogrollSource {
    fn name(&self) -> &'static str {
        "movabletype-blogroll"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::MovableType
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let mut batch = SourceBatch::new();
        let rows: Vec<PluginDataRow> = read_json_rows(&self.dir.join(PLUGIN_DATA_FILE), &mut batch).await?;

        for row in rows.into_iter().filter(|r| r.plugin == self.plugin) {
            if let Some(blob) = row.data.as_deref() {
                debug!(key = row.key.as_deref().unwrap_or_default(), "Decoding blogroll blob");
                self.decode_blob(blob, &mut batch);
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn entries() -> serde_json::Value {
        json!([
            {"id": 1, "blogId": 1, "authorId": 1, "title": "Plain", "format": "__default__",
             "excerpt": null, "text": "Intro", "keywords": "a, b", "more": "Rest",
             "basename": "plain", "created": "2004-02-03 04:05:06", "modified": "2004-02-04 00:00:00"},
            {"id": 2, "blogId": 1, "authorId": 1, "title": "Excerpted", "format": "textile_2",
             "excerpt": "Short", "text": "Long", "keywords": null, "more": " more",
             "basename": null, "created": "2004-03-01 00:00:00", "modified": null},
            {"id": 3, "blogId": 1, "authorId": 2, "title": "Someone else", "format": null,
             "excerpt": null, "text": "x", "keywords": null, "more": null,
             "basename": null, "created": "2004-03-01 00:00:00", "modified": null},
            {"id": 4, "blogId": 1, "authorId": 1, "title": "Draft", "format": null,
             "excerpt": null, "text": null, "keywords": null, "more": null,
             "basename": null, "created": "2004-03-01 00:00:00", "modified": null},
            {"id": "five"}
        ])
    }

    #[tokio::test]
    async fn test_entries_summary_rules_and_filters() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ENTRIES_FILE), entries().to_string()).unwrap();

        let config = MovableTypeConfig {
            user_list: vec![1],
            ..MovableTypeConfig::default()
        };
        let batch = MovableTypeSource::new(dir.path().to_path_buf(), config)
            .collect()
            .await
            .unwrap();

        assert_eq!(batch.invalid, 1);
        assert_eq!(batch.len(), 2);

        let plain = &batch.records[0];
        assert_eq!(plain.id, "mt-1");
        assert_eq!(plain.body, "IntroRest");
        assert_eq!(plain.description.as_deref(), Some("Intro"));
        assert_eq!(plain.tags, vec!["a", "b"]);
        assert_eq!(plain.slug.as_deref(), Some("plain"));
        assert_eq!(plain.format, BodyFormat::Text);
        assert_eq!(plain.blog.as_deref(), Some("mt-1"));

        let excerpted = &batch.records[1];
        assert_eq!(excerpted.body, "Long more");
        assert_eq!(excerpted.description.as_deref(), Some("Short"));
        assert_eq!(excerpted.format, BodyFormat::Textile);
    }

    #[tokio::test]
    async fn test_blogroll_blob_decoding() {
        let dir = TempDir::new().unwrap();
        let rows = json!([
            {"plugin": "Blogroll", "key": "links",
             "data": "http://a.example/|Site A|First site\nhttp://b.example/|Site B\n\n|No URL|x\njavascript:void(0)|Bad|"},
            {"plugin": "OtherPlugin", "key": "x", "data": "http://c.example/|C|"}
        ]);
        std::fs::write(dir.path().join(PLUGIN_DATA_FILE), rows.to_string()).unwrap();

        let source = MovableTypeBlogrollSource::new(dir.path().to_path_buf(), &MovableTypeConfig::default());
        let batch = source.collect().await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.urls_skipped, 2);
        assert_eq!(batch.records[0].name(), Some("Site A"));
        assert_eq!(batch.records[0].description(), Some("First site"));
        assert_eq!(batch.records[1].description(), None);
        assert!(batch.records.iter().all(|b| b.part_of() == SourceTag::MovableType));
    }

    #[tokio::test]
    async fn test_non_array_dump_fails_the_source() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PLUGIN_DATA_FILE), "{}").unwrap();

        let source = MovableTypeBlogrollSource::new(dir.path().to_path_buf(), &MovableTypeConfig::default());
        assert!(matches!(source.collect().await, Err(SourceError::Parse { .. })));
    }
}
