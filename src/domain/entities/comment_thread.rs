use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub is_anonymous: bool,
}

/// One comment of a hosted comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadComment {
    /// The comment host's numeric id
    pub id: u64,
    /// Identifier assigned by the commenting site, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_spam: bool,
    pub author: CommentAuthor,
    /// Id of the comment this one replies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
}

/// A discussion thread (usually one per blog post page) with its comments.
///
/// Threads without comments are never archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forum: Option<String>,
    /// Category title, resolved from the export's category list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Page the thread was attached to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<CommentAuthor>,
    pub is_closed: bool,
    pub is_deleted: bool,
    pub comments: Vec<ThreadComment>,
}

impl CommentThread {
    /// Name the thread is archived under
    pub fn archive_id(&self) -> String {
        format!("disqus-{}", self.id)
    }
}
