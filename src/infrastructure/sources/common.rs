use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::errors::SourceError;
use crate::application::sources::SourceBatch;
use crate::domain::entities::CanonicalBookmark;
use crate::domain::url_normalizer::{normalize_url, NormalizedUrl};

pub(crate) async fn read_to_string(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| SourceError::io(path, e))
}

/// Rows of a JSON array dump, each decoded on its own so one bad row only costs itself.
///
/// A document whose root is not an array fails the whole source.
pub(crate) async fn read_json_rows<T, R>(
    path: &Path,
    batch: &mut SourceBatch<R>,
) -> Result<Vec<T>, SourceError>
where
    T: DeserializeOwned,
{
    let contents = read_to_string(path).await?;
    let values: Vec<serde_json::Value> =
        serde_json::from_str(&contents).map_err(|e| SourceError::parse(path, e))?;
    Ok(decode_rows(path, values, batch))
}

/// Newline-delimited JSON, one row per non-blank line
pub(crate) async fn read_ndjson_rows<T, R>(
    path: &Path,
    batch: &mut SourceBatch<R>,
) -> Result<Vec<T>, SourceError>
where
    T: DeserializeOwned,
{
    let contents = read_to_string(path).await?;
    let mut values = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => values.push(value),
            Err(e) => {
                warn!(path = %path.display(), line = line_no + 1, error = %e, "Skipping malformed line");
                batch.reject();
            }
        }
    }
    Ok(decode_rows(path, values, batch))
}

fn decode_rows<T, R>(path: &Path, values: Vec<serde_json::Value>, batch: &mut SourceBatch<R>) -> Vec<T>
where
    T: DeserializeOwned,
{
    let mut rows = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value(value) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed row");
                batch.reject();
            }
        }
    }
    rows
}

/// An `<a>` element pulled out of an exported HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub href: Option<String>,
    pub text: String,
    /// Attribute names are lower-cased by the HTML parser
    pub attributes: HashMap<String, String>,
}

impl Anchor {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Anchors matching `selector`, in document order.
///
/// Kept synchronous: the parsed document is not `Send` and must not live
/// across an await point.
pub(crate) fn select_anchors(html: &str, selector: &str) -> Result<Vec<Anchor>, String> {
    let selector = Selector::parse(selector).map_err(|e| e.to_string())?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .map(|element| {
            let value = element.value();
            Anchor {
                href: value.attr("href").map(str::to_string),
                text: element.text().collect::<String>().trim().to_string(),
                attributes: value
                    .attrs()
                    .map(|(name, v)| (name.to_string(), v.to_string()))
                    .collect(),
            }
        })
        .collect())
}

/// Files directly inside `dir` with the given extension, sorted by path
pub(crate) async fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SourceError> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| SourceError::io(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SourceError::io(dir, e))?
    {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Normalise `raw`, counting a rejection against the batch
pub(crate) fn normalize_or_skip(
    raw: &str,
    source: &str,
    batch: &mut SourceBatch<CanonicalBookmark>,
) -> Option<NormalizedUrl> {
    match normalize_url(raw) {
        Ok(normalized) => Some(normalized),
        Err(reason) => {
            debug!(source, url = raw, %reason, "Skipping URL");
            batch.skip_url();
            None
        }
    }
}

pub(crate) fn from_epoch_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), or a bare date
pub(crate) fn parse_loose_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

/// True if `date` falls before the start of `cutoff` (UTC)
pub(crate) fn is_before(date: DateTime<Utc>, cutoff: Option<NaiveDate>) -> bool {
    cutoff.is_some_and(|cutoff| date.date_naive() < cutoff)
}

pub(crate) async fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).await.ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_loose_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2004, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(parse_loose_datetime("2004-05-06T07:08:09Z"), Some(expected));
        assert_eq!(parse_loose_datetime("2004-05-06T09:08:09+02:00"), Some(expected));
        assert_eq!(parse_loose_datetime("2004-05-06 07:08:09"), Some(expected));
        assert_eq!(
            parse_loose_datetime("2004-05-06"),
            Some(Utc.with_ymd_and_hms(2004, 5, 6, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_loose_datetime("last tuesday"), None);
    }

    #[test]
    fn test_is_before() {
        let date = Utc.with_ymd_and_hms(2001, 12, 31, 23, 59, 0).unwrap();
        assert!(is_before(date, NaiveDate::from_ymd_opt(2002, 1, 1)));
        assert!(!is_before(date, NaiveDate::from_ymd_opt(2001, 12, 31)));
        assert!(!is_before(date, None));
    }

    #[test]
    fn test_select_anchors_lowercases_attributes() {
        let html = r#"<dl><dt><a HREF="https://a.example/" ADD_DATE="1000">A <b>site</b></a></dt></dl>"#;
        let anchors = select_anchors(html, "dt > a").unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].href.as_deref(), Some("https://a.example/"));
        assert_eq!(anchors[0].text, "A site");
        assert_eq!(anchors[0].attr("add_date"), Some("1000"));
    }

    #[test]
    fn test_select_anchors_bad_selector() {
        assert!(select_anchors("<a></a>", "a >>> ").is_err());
    }

    #[tokio::test]
    async fn test_read_json_rows_counts_bad_rows() {
        #[derive(serde::Deserialize)]
        struct Row {
            #[allow(dead_code)]
            href: String,
        }

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, r#"[{"href": "a"}, {"nope": 1}, {"href": "b"}]"#).unwrap();

        let mut batch: SourceBatch<CanonicalBookmark> = SourceBatch::new();
        let rows: Vec<Row> = read_json_rows(&path, &mut batch).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(batch.invalid, 1);

        std::fs::write(&path, r#"{"href": "a"}"#).unwrap();
        let result: Result<Vec<Row>, _> = read_json_rows(&path, &mut batch).await;
        assert!(matches!(result, Err(SourceError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_read_ndjson_rows_skips_blank_and_broken_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("link.ndjson");
        std::fs::write(&path, "{\"url\": \"a\"}\n\n{broken\n{\"url\": \"b\"}\n").unwrap();

        let mut batch: SourceBatch<CanonicalBookmark> = SourceBatch::new();
        let rows: Vec<serde_json::Value> = read_ndjson_rows(&path, &mut batch).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(batch.invalid, 1);
    }

    #[test]
    fn test_normalize_or_skip_counts() {
        let mut batch = SourceBatch::new();
        assert!(normalize_or_skip("", "test", &mut batch).is_none());
        assert!(normalize_or_skip("not a url", "test", &mut batch).is_none());
        assert!(normalize_or_skip("https://example.com", "test", &mut batch).is_some());
        assert_eq!(batch.urls_skipped, 2);
    }
}
