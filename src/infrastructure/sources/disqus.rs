//! Disqus comment export reader.
//!
//! The export is one flat `<disqus>` document: `<category>`, `<thread>` and
//! `<post>` elements, each carrying a `dsq:id` attribute. Threads point at
//! their category and posts at their thread (and parent post) through empty
//! elements with the same attribute. Posts are grouped under their thread;
//! threads that end up without comments are dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};

use super::common::{files_with_extension, read_to_string};
use super::livejournal_xml::ExportError;
use crate::application::errors::SourceError;
use crate::application::sources::{SourceBatch, ThreadSource};
use crate::domain::entities::{CommentAuthor, CommentThread, ThreadComment};

const ID_ATTRIBUTE: &str = "dsq:id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Category,
    Thread,
    Post,
}

impl RecordKind {
    fn from_element(name: &str) -> Option<Self> {
        match name {
            "category" => Some(RecordKind::Category),
            "thread" => Some(RecordKind::Thread),
            "post" => Some(RecordKind::Post),
            _ => None,
        }
    }

    /// Child elements that reference another record by `dsq:id`
    fn is_reference(self, child: &str) -> bool {
        matches!(
            (self, child),
            (RecordKind::Thread, "category") | (RecordKind::Post, "thread" | "parent")
        )
    }
}

#[derive(Debug)]
struct RecordDraft {
    kind: RecordKind,
    did: Option<u64>,
    /// Text content keyed by path below the record, e.g. `author/name`
    text: HashMap<String, String>,
    references: HashMap<String, u64>,
}

impl RecordDraft {
    fn new(kind: RecordKind, did: Option<u64>) -> Self {
        Self {
            kind,
            did,
            text: HashMap::new(),
            references: HashMap::new(),
        }
    }

    fn text(&self, key: &str) -> Option<String> {
        self.text
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn flag(&self, key: &str) -> bool {
        self.text(key)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        self.text(key)
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|date| date.with_timezone(&Utc))
    }

    fn author(&self) -> Option<CommentAuthor> {
        let present = self.text.keys().any(|key| key.starts_with("author/"));
        present.then(|| CommentAuthor {
            name: self.text("author/name"),
            username: self.text("author/username"),
            is_anonymous: self.flag("author/isAnonymous"),
        })
    }
}

/// Everything one export document yielded
#[derive(Debug, Default)]
pub struct DisqusExport {
    /// Threads with at least one comment, in document order
    pub threads: Vec<CommentThread>,
    /// Records without a usable `dsq:id`, and posts whose thread is missing
    pub rejected: usize,
    /// Threads dropped for having no comments
    pub empty_threads: usize,
}

#[derive(Debug, Default)]
struct Collected {
    categories: HashMap<u64, String>,
    threads: Vec<(RecordDraft, Option<u64>)>,
    posts: Vec<(u64, ThreadComment)>,
    rejected: usize,
}

impl Collected {
    fn finish(&mut self, draft: RecordDraft) {
        let Some(did) = draft.did else {
            debug!(kind = ?draft.kind, "Record without dsq:id dropped");
            self.rejected += 1;
            return;
        };

        match draft.kind {
            RecordKind::Category => {
                if let Some(title) = draft.text("title") {
                    self.categories.insert(did, title);
                }
            }
            RecordKind::Thread => {
                let category = draft.references.get("category").copied();
                self.threads.push((draft, category));
            }
            RecordKind::Post => {
                let Some(thread) = draft.references.get("thread").copied() else {
                    debug!(post = did, "Post without a thread dropped");
                    self.rejected += 1;
                    return;
                };
                let comment = ThreadComment {
                    id: did,
                    identifier: draft.text("id"),
                    message: draft.text("message"),
                    created: draft.date("createdAt"),
                    is_deleted: draft.flag("isDeleted"),
                    is_spam: draft.flag("isSpam"),
                    author: draft.author().unwrap_or_default(),
                    parent: draft.references.get("parent").copied(),
                };
                self.posts.push((thread, comment));
            }
        }
    }

    fn group(self) -> DisqusExport {
        let mut export = DisqusExport {
            rejected: self.rejected,
            ..DisqusExport::default()
        };

        let mut by_thread: HashMap<u64, Vec<ThreadComment>> = HashMap::new();
        for (thread, comment) in self.posts {
            by_thread.entry(thread).or_default().push(comment);
        }

        for (draft, category) in self.threads {
            let Some(did) = draft.did else { continue };
            let comments = by_thread.remove(&did).unwrap_or_default();
            if comments.is_empty() {
                export.empty_threads += 1;
                continue;
            }

            export.threads.push(CommentThread {
                id: did,
                identifier: draft.text("id"),
                forum: draft.text("forum"),
                category: category.and_then(|c| self.categories.get(&c).cloned()),
                link: draft.text("link"),
                title: draft.text("title"),
                message: draft.text("message"),
                created: draft.date("createdAt"),
                author: draft.author(),
                is_closed: draft.flag("isClosed"),
                is_deleted: draft.flag("isDeleted"),
                comments,
            });
        }

        for (thread, orphans) in by_thread {
            warn!(thread, count = orphans.len(), "Comments reference a missing thread");
            export.rejected += orphans.len();
        }

        export
    }
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn record_id(element: &BytesStart<'_>) -> Result<Option<u64>, ExportError> {
    let attribute = element
        .try_get_attribute(ID_ATTRIBUTE)
        .map_err(quick_xml::Error::from)?;
    Ok(attribute.and_then(|attr| {
        std::str::from_utf8(&attr.value)
            .ok()
            .and_then(|value| value.trim().parse().ok())
    }))
}

/// Handle an opening (or self-closing) element.
///
/// Depth 1 elements are records; depth 2 reference elements resolve to ids.
fn open_element(
    element: &BytesStart<'_>,
    stack: &[String],
    current: &mut Option<RecordDraft>,
) -> Result<(), ExportError> {
    let name = element_name(element);
    if stack.len() == 1 {
        *current = match RecordKind::from_element(&name) {
            Some(kind) => Some(RecordDraft::new(kind, record_id(element)?)),
            None => None,
        };
        return Ok(());
    }

    if let (2, Some(draft)) = (stack.len(), current.as_mut()) {
        if draft.kind.is_reference(&name) {
            if let Some(did) = record_id(element)? {
                draft.references.insert(name, did);
            }
        }
    }
    Ok(())
}

/// Parse one export document and group its posts under their threads
pub fn parse_disqus(xml: &str) -> Result<DisqusExport, ExportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<RecordDraft> = None;
    let mut collected = Collected::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open_element(&e, &stack, &mut current)?;
                stack.push(element_name(&e));
            }
            Event::Empty(e) => {
                open_element(&e, &stack, &mut current)?;
                if stack.len() == 1 {
                    if let Some(draft) = current.take() {
                        collected.finish(draft);
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
                if stack.len() == 1 {
                    if let Some(draft) = current.take() {
                        collected.finish(draft);
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                append_text(&stack, current.as_mut(), &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                append_text(&stack, current.as_mut(), &text);
            }
            Event::Eof => {
                if let Some(open) = stack.pop() {
                    return Err(ExportError::Unclosed(open));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(collected.group())
}

fn append_text(stack: &[String], draft: Option<&mut RecordDraft>, text: &str) {
    let (Some(draft), Some(path)) = (draft, stack.get(2..)) else {
        return;
    };
    if path.is_empty() {
        return;
    }
    draft.text.entry(path.join("/")).or_default().push_str(text);
}

/// Reads every `.xml` Disqus export in a directory
pub struct DisqusSource {
    dir: PathBuf,
}

impl DisqusSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    async fn read_file(&self, path: &Path, batch: &mut SourceBatch<CommentThread>) -> Result<(), SourceError> {
        let xml = read_to_string(path).await?;
        let export = parse_disqus(&xml).map_err(|e| SourceError::parse(path, e))?;

        debug!(
            path = %path.display(),
            threads = export.threads.len(),
            empty = export.empty_threads,
            "Disqus export parsed"
        );
        batch.invalid += export.rejected;
        batch.records.extend(export.threads);
        Ok(())
    }
}

#[async_trait]
impl ThreadSource for DisqusSource {
    fn name(&self) -> &'static str {
        "disqus"
    }

    async fn collect(&self) -> Result<SourceBatch<CommentThread>, SourceError> {
        let mut batch = SourceBatch::new();
        for path in files_with_extension(&self.dir, "xml").await? {
            if let Err(e) = self.read_file(&path, &mut batch).await {
                warn!(error = %e, "Skipping export file");
                batch.reject();
            }
        }
        info!(threads = batch.len(), "Disqus exports read");
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<disqus xmlns="http://disqus.com" xmlns:dsq="http://disqus.com/disqus-internals">
  <category dsq:id="10">
    <forum>myblog</forum>
    <title>General</title>
    <isDefault>true</isDefault>
  </category>
  <thread dsq:id="100">
    <id>post-1</id>
    <forum>myblog</forum>
    <category dsq:id="10" />
    <link>http://blog.example.com/2009/first</link>
    <title>First &amp; foremost</title>
    <message><![CDATA[<p>Thread body</p>]]></message>
    <createdAt>2009-03-04T05:06:07Z</createdAt>
    <author>
      <name>Owner</name>
      <isAnonymous>false</isAnonymous>
      <username>owner</username>
    </author>
    <isClosed>false</isClosed>
    <isDeleted>false</isDeleted>
  </thread>
  <thread dsq:id="101">
    <link>http://blog.example.com/2009/quiet</link>
    <category dsq:id="10" />
  </thread>
  <post dsq:id="500">
    <message><![CDATA[<p>Great post</p>]]></message>
    <createdAt>2009-03-05T00:00:00Z</createdAt>
    <isDeleted>false</isDeleted>
    <isSpam>false</isSpam>
    <author>
      <name>Reader</name>
      <isAnonymous>true</isAnonymous>
    </author>
    <thread dsq:id="100" />
  </post>
  <post dsq:id="501">
    <message>Thanks!</message>
    <createdAt>2009-03-05T01:00:00Z</createdAt>
    <isSpam>true</isSpam>
    <author><name>Owner</name><isAnonymous>false</isAnonymous></author>
    <thread dsq:id="100" />
    <parent dsq:id="500" />
  </post>
  <post dsq:id="502">
    <message>Lost</message>
    <thread dsq:id="999" />
  </post>
  <post>
    <message>No id</message>
    <thread dsq:id="100" />
  </post>
</disqus>"#;

    #[test]
    fn test_posts_are_grouped_under_threads() {
        let export = parse_disqus(EXPORT).unwrap();

        assert_eq!(export.threads.len(), 1);
        assert_eq!(export.empty_threads, 1);
        // The id-less post and the post of a missing thread
        assert_eq!(export.rejected, 2);

        let thread = &export.threads[0];
        assert_eq!(thread.id, 100);
        assert_eq!(thread.identifier.as_deref(), Some("post-1"));
        assert_eq!(thread.category.as_deref(), Some("General"));
        assert_eq!(thread.title.as_deref(), Some("First & foremost"));
        assert_eq!(thread.message.as_deref(), Some("<p>Thread body</p>"));
        assert_eq!(
            thread.created,
            Some(Utc.with_ymd_and_hms(2009, 3, 4, 5, 6, 7).unwrap())
        );
        let owner = thread.author.as_ref().unwrap();
        assert_eq!(owner.username.as_deref(), Some("owner"));
        assert!(!owner.is_anonymous);

        let ids: Vec<u64> = thread.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![500, 501]);
        assert!(thread.comments[0].author.is_anonymous);
        assert_eq!(thread.comments[0].message.as_deref(), Some("<p>Great post</p>"));
        assert_eq!(thread.comments[1].parent, Some(500));
        assert!(thread.comments[1].is_spam);
        assert!(!thread.comments[1].is_deleted);
    }

    #[test]
    fn test_unknown_category_is_left_empty() {
        let xml = r#"<disqus xmlns:dsq="x">
            <thread dsq:id="1"><category dsq:id="42"/></thread>
            <post dsq:id="2"><thread dsq:id="1"/></post>
        </disqus>"#;
        let export = parse_disqus(xml).unwrap();
        assert_eq!(export.threads.len(), 1);
        assert!(export.threads[0].category.is_none());
        assert_eq!(export.threads[0].comments[0].author, CommentAuthor::default());
    }

    #[test]
    fn test_unclosed_document_is_an_error() {
        assert!(parse_disqus(r#"<disqus><thread dsq:id="1">"#).is_err());
    }

    #[tokio::test]
    async fn test_collect_counts_rejections_per_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("comments.xml"), EXPORT).unwrap();
        std::fs::write(dir.path().join("broken.xml"), "<disqus><thread>").unwrap();

        let batch = DisqusSource::new(dir.path().to_path_buf())
            .collect()
            .await
            .unwrap();

        assert_eq!(batch.len(), 1);
        // Two rejected posts plus the unreadable file
        assert_eq!(batch.invalid, 3);
    }

    #[tokio::test]
    async fn test_missing_directory_fails_the_source() {
        let source = DisqusSource::new(PathBuf::from("/nonexistent/disqus"));
        assert!(source.collect().await.is_err());
    }
}
