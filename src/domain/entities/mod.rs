mod archived_post;
mod bookmark;
mod comment_thread;
mod journal_entry;
mod semagic_entry;

pub use archived_post::{ArchivedPost, PostDates};
pub use bookmark::{BookmarkDates, CanonicalBookmark};
pub use comment_thread::{CommentAuthor, CommentThread, ThreadComment};
pub use journal_entry::{JournalComment, JournalEntry};
pub use semagic_entry::RawSemagicEntry;
