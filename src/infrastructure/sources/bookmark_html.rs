//! Bookmark pages exported as HTML: Pocket's `ril_export.html` and the
//! Netscape bookmark format browsers write for favorites.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::common::{from_epoch_seconds, normalize_or_skip, read_to_string, select_anchors, Anchor};
use crate::application::errors::SourceError;
use crate::application::sources::{BookmarkSource, SourceBatch};
use crate::domain::entities::CanonicalBookmark;
use crate::domain::value_objects::SourceTag;

pub const POCKET_FILE: &str = "getpocket.html";
pub const FAVORITES_FILE: &str = "favorites.html";

const POCKET_SELECTOR: &str = "li > a";
const FAVORITES_SELECTOR: &str = "dt > a";

static TAG_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("Invalid tag separator regex"));

/// Some exports stored an ellipsis in a legacy code page that decodes as U+FFFD
const REPLACEMENT_CHAR: char = '\u{FFFD}';
const ELLIPSIS: char = '\u{2026}';

fn epoch_attr(anchor: &Anchor, name: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    anchor
        .attr(name)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(from_epoch_seconds)
}

async fn read_anchors(path: &Path, selector: &str) -> Result<Vec<Anchor>, SourceError> {
    let html = read_to_string(path).await?;
    select_anchors(&html, selector).map_err(|e| SourceError::parse(path, e))
}

/// Pocket export: one `<li><a href time_added tags>` per saved item
pub struct PocketSource {
    path: PathBuf,
}

impl PocketSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BookmarkSource for PocketSource {
    fn name(&self) -> &'static str {
        "pocket"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Pocket
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let anchors = read_anchors(&self.path, POCKET_SELECTOR).await?;
        let mut batch = SourceBatch::new();

        for anchor in anchors {
            let Some(url) = normalize_or_skip(anchor.href.as_deref().unwrap_or_default(), self.name(), &mut batch)
            else {
                continue;
            };
            let tags: Vec<String> = anchor
                .attr("tags")
                .map(|t| TAG_SEPARATOR.split(t).map(str::to_string).collect())
                .unwrap_or_default();

            batch.push(
                CanonicalBookmark::new(url, SourceTag::Pocket)
                    .with_name(Some(anchor.text.clone()))
                    .with_created(epoch_attr(&anchor, "time_added"))
                    .with_keywords(tags),
            );
        }

        debug!(bookmarks = batch.len(), "Pocket export read");
        Ok(batch)
    }
}

/// Netscape-format favorites: `<dt><a href add_date>` under nested `<dl>` lists
pub struct FavoritesSource {
    path: PathBuf,
}

impl FavoritesSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BookmarkSource for FavoritesSource {
    fn name(&self) -> &'static str {
        "favorites"
    }

    fn tag(&self) -> SourceTag {
        SourceTag::Favorites
    }

    async fn collect(&self) -> Result<SourceBatch<CanonicalBookmark>, SourceError> {
        let anchors = read_anchors(&self.path, FAVORITES_SELECTOR).await?;
        let mut batch = SourceBatch::new();

        for anchor in anchors {
            let Some(url) = normalize_or_skip(anchor.href.as_deref().unwrap_or_default(), self.name(), &mut batch)
            else {
                continue;
            };
            let name = anchor.text.replace(REPLACEMENT_CHAR, &ELLIPSIS.to_string());

            batch.push(
                CanonicalBookmark::new(url, SourceTag::Favorites)
                    .with_name(Some(name))
                    .with_created(epoch_attr(&anchor, "add_date")),
            );
        }

        debug!(bookmarks = batch.len(), "Favorites read");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    const POCKET_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<h1>Unread</h1>
<ul>
  <li><a href="https://example.com/article" time_added="1420070400" tags="rust,longread">An article</a></li>
  <li><a href="https://example.com/untagged" time_added="1420070400" tags="">Untagged</a></li>
  <li><a time_added="1420070400">No link</a></li>
</ul>
</body></html>"#;

    const FAVORITES_HTML: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><A HREF=\"http://example.net/\" ADD_DATE=\"978307200\">Example \u{FFFD}</A>
    <DT><H3>Folder</H3>
    <DL><p>
        <DT><A HREF=\"http://example.net/nested\">Nested</A>
        <DT><A HREF=\"javascript:alert(1)\">Bookmarklet</A>
    </DL><p>
</DL><p>";

    #[tokio::test]
    async fn test_pocket_anchors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(POCKET_FILE);
        std::fs::write(&path, POCKET_HTML).unwrap();

        let batch = PocketSource::new(path).collect().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.urls_skipped, 1);

        let article = &batch.records[0];
        assert_eq!(article.name(), Some("An article"));
        assert_eq!(article.keywords(), &["rust", "longread"]);
        assert_eq!(
            article.created(),
            Some(Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(batch.records[1].keywords().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_nested_lists_and_ellipsis() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FAVORITES_FILE);
        std::fs::write(&path, FAVORITES_HTML).unwrap();

        let batch = FavoritesSource::new(path).collect().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.urls_skipped, 1);

        let first = &batch.records[0];
        assert_eq!(first.name(), Some("Example \u{2026}"));
        assert_eq!(
            first.created(),
            Some(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(first.part_of(), SourceTag::Favorites);
        assert!(batch.records[1].created().is_none());
    }
}
