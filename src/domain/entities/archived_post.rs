use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{JournalComment, JournalEntry, RawSemagicEntry};
use crate::domain::markup::BodyFormat;
use crate::domain::value_objects::SourceTag;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDates {
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// A normalized blog post ready to be written to the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedPost {
    /// Archive-wide id, prefixed by source (`lj-123`, `mt-45`)
    pub id: String,
    pub source: SourceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: PostDates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<String>,
    pub format: BodyFormat,
    #[serde(skip)]
    pub body: String,
    #[serde(skip)]
    pub comments: Vec<JournalComment>,
}

impl ArchivedPost {
    pub fn year(&self) -> i32 {
        self.date.created.year()
    }
}

impl From<RawSemagicEntry> for ArchivedPost {
    fn from(entry: RawSemagicEntry) -> Self {
        Self {
            id: format!("lj-{}", entry.id),
            source: SourceTag::Livejournal,
            name: entry.subject,
            slug: None,
            description: None,
            date: PostDates {
                created: entry.date,
                modified: None,
            },
            tags: Vec::new(),
            mood: entry.mood,
            music: entry.music,
            avatar: entry.avatar,
            blog: None,
            format: BodyFormat::Html,
            body: entry.body.unwrap_or_default(),
            comments: Vec::new(),
        }
    }
}

impl From<JournalEntry> for ArchivedPost {
    fn from(entry: JournalEntry) -> Self {
        Self {
            id: format!("lj-{}", entry.id),
            source: SourceTag::Livejournal,
            name: entry.subject,
            slug: None,
            description: None,
            date: PostDates {
                created: entry.date,
                modified: None,
            },
            tags: Vec::new(),
            mood: entry.mood,
            music: entry.music,
            avatar: entry.avatar,
            blog: None,
            format: BodyFormat::Html,
            body: entry.body.unwrap_or_default(),
            comments: entry.comments,
        }
    }
}
