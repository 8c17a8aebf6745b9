mod bookmark_id;
mod canonical_url;
mod source_tag;

pub use bookmark_id::BookmarkId;
pub use canonical_url::CanonicalUrl;
pub use source_tag::SourceTag;
