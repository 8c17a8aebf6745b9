mod copy_media;
mod import_blog_posts;
mod import_bookmarks;
mod import_comment_threads;
mod populate_journal_cache;

pub use copy_media::CopyMediaUseCase;
pub use import_blog_posts::ImportBlogPostsUseCase;
pub use import_bookmarks::ImportBookmarksUseCase;
pub use import_comment_threads::ImportCommentThreadsUseCase;
pub use populate_journal_cache::PopulateJournalCacheUseCase;
