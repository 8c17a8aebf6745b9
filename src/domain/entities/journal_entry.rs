use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// A reply attached to a journal entry in an XML export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalComment {
    pub id: u32,
    pub parent: Option<u32>,
    pub date: DateTime<Utc>,
    pub body: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A journal entry extracted from a LiveJournal XML export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: u32,
    pub date: DateTime<Utc>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub music: Option<String>,
    pub mood: Option<String>,
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<JournalComment>,
}

impl JournalEntry {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
