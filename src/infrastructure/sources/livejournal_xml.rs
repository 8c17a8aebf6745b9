//! LiveJournal XML export reader.
//!
//! Each `<entry>` holds `itemid`, `eventtime`, `subject`, `event`,
//! `current_mood`, `current_music` and `avatar`, followed by any number of
//! `<comment>` elements (optionally wrapped in `<comments>`) with `itemid`,
//! `parent_itemid`, `eventtime`, `event` and `author/name`, `author/email`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::common::{files_with_extension, is_before, read_to_string};
use crate::application::errors::SourceError;
use crate::application::sources::{JournalRecord, JournalSource, SourceBatch};
use crate::domain::entities::{JournalComment, JournalEntry};

pub const XML_PARTITION: &str = "livejournal/xml";

const EVENT_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Default)]
struct CommentDraft {
    id: String,
    parent: String,
    date: String,
    body: String,
    name: String,
    email: String,
}

#[derive(Debug, Default)]
struct EntryDraft {
    id: String,
    date: String,
    subject: String,
    body: String,
    mood: String,
    music: String,
    avatar: String,
    comments: Vec<CommentDraft>,
}

fn parse_event_time(value: &str) -> Option<DateTime<Utc>> {
    EVENT_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .map(|date| date.and_utc())
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl CommentDraft {
    fn build(self) -> Option<JournalComment> {
        Some(JournalComment {
            id: self.id.trim().parse().ok()?,
            parent: self.parent.trim().parse().ok(),
            date: parse_event_time(&self.date)?,
            body: optional(self.body),
            name: optional(self.name),
            email: optional(self.email),
        })
    }
}

impl EntryDraft {
    fn build(self) -> Result<JournalEntry, String> {
        let id = self
            .id
            .trim()
            .parse()
            .map_err(|_| format!("bad itemid '{}'", self.id.trim()))?;
        let date = parse_event_time(&self.date)
            .ok_or_else(|| format!("bad eventtime '{}' on entry {}", self.date.trim(), id))?;

        let mut comments = Vec::with_capacity(self.comments.len());
        for draft in self.comments {
            match draft.build() {
                Some(comment) => comments.push(comment),
                None => debug!(entry = id, "Dropping malformed comment"),
            }
        }

        Ok(JournalEntry {
            id,
            date,
            subject: optional(self.subject),
            body: optional(self.body),
            music: optional(self.music),
            mood: optional(self.mood),
            avatar: optional(self.avatar),
            comments,
        })
    }

    fn field(&mut self, element: &str) -> Option<&mut String> {
        match element {
            "itemid" => Some(&mut self.id),
            "eventtime" => Some(&mut self.date),
            "subject" => Some(&mut self.subject),
            "event" => Some(&mut self.body),
            "current_mood" => Some(&mut self.mood),
            "current_music" => Some(&mut self.music),
            "avatar" => Some(&mut self.avatar),
            _ => None,
        }
    }
}

impl CommentDraft {
    fn field(&mut self, element: &str, parent: &str) -> Option<&mut String> {
        match (parent, element) {
            ("author", "name") => Some(&mut self.name),
            ("author", "email") => Some(&mut self.email),
            ("comment", "itemid") => Some(&mut self.id),
            ("comment", "parent_itemid") => Some(&mut self.parent),
            ("comment", "eventtime") => Some(&mut self.date),
            ("comment", "event") => Some(&mut self.body),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("Document ends inside <{0}>")]
    Unclosed(String),
}

/// Parse one export document.
///
/// Entries that fail to build are returned as errors next to the good ones;
/// an XML syntax error fails the whole document.
pub fn parse_export(xml: &str) -> Result<Vec<Result<JournalEntry, String>>, ExportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut entry: Option<EntryDraft> = None;
    let mut comment: Option<CommentDraft> = None;
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "entry" => entry = Some(EntryDraft::default()),
                    "comment" if entry.is_some() => comment = Some(CommentDraft::default()),
                    _ => {}
                }
                stack.push(name);
            }
            Event::End(_) => {
                match stack.pop().as_deref() {
                    Some("comment") => {
                        if let (Some(draft), Some(entry)) = (comment.take(), entry.as_mut()) {
                            entry.comments.push(draft);
                        }
                    }
                    Some("entry") => {
                        if let Some(draft) = entry.take() {
                            entries.push(draft.build());
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                append_text(&stack, entry.as_mut(), comment.as_mut(), &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                append_text(&stack, entry.as_mut(), comment.as_mut(), &text);
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

    Ok(entries)
}

fn append_text(stack: &[String], entry: Option<&mut EntryDraft>, comment: Option<&mut CommentDraft>, text: &str) {
    let [.., parent, element] = stack else {
        return;
    };

    let target = match (comment, entry) {
        (Some(comment), _) => comment.field(element, parent),
        (None, Some(entry)) if parent == "entry" => entry.field(element),
        _ => None,
    };
    if let Some(target) = target {
        target.push_str(text);
    }
}

/// Reads every `.xml` export in a directory
pub struct LivejournalXmlSource {
    dir: PathBuf,
    ignore_before: Option<NaiveDate>,
}

impl LivejournalXmlSource {
    pub fn new(dir: PathBuf, ignore_before: Option<NaiveDate>) -> Self {
        Self { dir, ignore_before }
    }

    async fn read_file(&self, path: &Path, batch: &mut SourceBatch<JournalRecord>) -> Result<(), SourceError> {
        let xml = read_to_string(path).await?;
        let entries = parse_export(&xml).map_err(|e| SourceError::parse(path, e))?;

        for entry in entries {
            match entry {
                Ok(entry) if is_before(entry.date, self.ignore_before) => {
                    debug!(id = entry.id, "Entry predates cutoff, dropped");
                }
                Ok(entry) => batch.push(JournalRecord::Export(entry)),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "Skipping malformed entry");
                    batch.reject();
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl JournalSource for LivejournalXmlSource {
    fn name(&self) -> &'static str {
        "livejournal-xml"
    }

    fn partition(&self) -> &'static str {
        XML_PARTITION
    }

    async fn collect(&self) -> Result<SourceBatch<JournalRecord>, SourceError> {
        let mut batch = SourceBatch::new();
        for path in files_with_extension(&self.dir, "xml").await? {
            // One unreadable export does not stop the others
            if let Err(e) = self.read_file(&path, &mut batch).await {
                warn!(error = %e, "Skipping export file");
                batch.reject();
            }
        }
        info!(entries = batch.len(), "LiveJournal exports read");
        Ok(batch)
    }
}
