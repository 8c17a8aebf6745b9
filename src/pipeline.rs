//! Wires the configured adapters into the import use cases

use std::sync::Arc;

use tracing::info;

use crate::application::batch::BatchConfig;
use crate::application::errors::ImportError;
use crate::application::ports::{ArchiveSink, RecordCache};
use crate::application::report::ImportReport;
use crate::application::sources::{BookmarkSource, JournalSource, PostSource, ThreadSource};
use crate::application::use_cases::{
    CopyMediaUseCase, ImportBlogPostsUseCase, ImportBookmarksUseCase,
    ImportCommentThreadsUseCase, PopulateJournalCacheUseCase,
};
use crate::config::{Config, ConfigError};
use crate::infrastructure::sources::{
    DeliciousSource, DesktopDbSource, DisqusSource, FavoritesSource, InstapaperSource, LivejournalPostSource,
    LivejournalXmlSource, MovableTypeBlogrollSource, MovableTypeSource, PinboardSource,
    PocketSource, SemagicFileSource, DELICIOUS_FILE, FAVORITES_FILE, INSTAPAPER_FILE,
    PINBOARD_FILE, POCKET_FILE,
};
use crate::infrastructure::storage::{FileArchiveSink, JsonRecordCache, PathBuilder};

/// Fully wired import run
pub struct ArchivePipeline {
    populate: PopulateJournalCacheUseCase,
    blogs: ImportBlogPostsUseCase,
    threads: ImportCommentThreadsUseCase,
    bookmarks: ImportBookmarksUseCase,
    media: CopyMediaUseCase,
}

impl ArchivePipeline {
    pub fn new(
        populate: PopulateJournalCacheUseCase,
        blogs: ImportBlogPostsUseCase,
        threads: ImportCommentThreadsUseCase,
        bookmarks: ImportBookmarksUseCase,
        media: CopyMediaUseCase,
    ) -> Self {
        Self {
            populate,
            blogs,
            threads,
            bookmarks,
            media,
        }
    }

    /// Build every adapter from `config`. Nothing touches the filesystem until a run starts.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let paths = PathBuilder::new(config.cache_root.clone(), config.output_root.clone());
        let cache: Arc<dyn RecordCache> = Arc::new(JsonRecordCache::with_durability(
            paths.clone(),
            config.durable_writes,
        ));
        let sink: Arc<dyn ArchiveSink> =
            Arc::new(FileArchiveSink::with_durability(paths, config.durable_writes));

        let livejournal_dir = config.livejournal_dir();
        let ignore_before = config.livejournal.ignore_before;
        let journal_sources: Vec<Arc<dyn JournalSource>> = vec![
            Arc::new(
                SemagicFileSource::new(
                    livejournal_dir.clone(),
                    BatchConfig::new(config.decode_concurrency),
                )
                .with_ignore_before(ignore_before),
            ),
            Arc::new(LivejournalXmlSource::new(livejournal_dir, ignore_before)),
        ];

        let post_sources: Vec<Arc<dyn PostSource>> = vec![
            Arc::new(LivejournalPostSource::new(Arc::clone(&cache))),
            Arc::new(MovableTypeSource::new(
                config.movabletype_dir(),
                config.movabletype.clone(),
            )),
        ];

        let thread_sources: Vec<Arc<dyn ThreadSource>> =
            vec![Arc::new(DisqusSource::new(config.disqus_dir()))];

        let bookmarks_dir = config.bookmarks_dir();
        let desktop_db_dir = config.desktop_db_dir();
        let bookmark_sources: Vec<Arc<dyn BookmarkSource>> = vec![
            Arc::new(FavoritesSource::new(bookmarks_dir.join(FAVORITES_FILE))),
            Arc::new(DesktopDbSource::predicate(&desktop_db_dir)),
            Arc::new(DesktopDbSource::havana(&desktop_db_dir)),
            Arc::new(DeliciousSource::new(bookmarks_dir.join(DELICIOUS_FILE))),
            Arc::new(PinboardSource::new(bookmarks_dir.join(PINBOARD_FILE))),
            Arc::new(InstapaperSource::new(bookmarks_dir.join(INSTAPAPER_FILE))),
            Arc::new(PocketSource::new(bookmarks_dir.join(POCKET_FILE))),
            Arc::new(MovableTypeBlogrollSource::new(
                config.movabletype_dir(),
                &config.movabletype,
            )),
        ];

        Ok(Self::new(
            PopulateJournalCacheUseCase::new(Arc::clone(&cache), journal_sources),
            ImportBlogPostsUseCase::new(
                post_sources,
                Arc::clone(&sink),
                config.movabletype.unconvertible_body,
            ),
            ImportCommentThreadsUseCase::new(thread_sources, Arc::clone(&sink)),
            ImportBookmarksUseCase::new(
                bookmark_sources,
                Arc::clone(&sink),
                config.bookmark_sources.clone(),
            ),
            CopyMediaUseCase::new(config.media_collections()?, sink),
        ))
    }

    pub async fn populate(&self, force: bool) -> Result<ImportReport, ImportError> {
        self.populate.execute(force).await
    }

    /// Posts first, then the hosted comment threads that belong to them
    pub async fn import_blogs(&self) -> Result<ImportReport, ImportError> {
        let mut report = self.blogs.execute().await?;
        report.merge(self.threads.execute().await?);
        Ok(report)
    }

    pub async fn import_bookmarks(&self) -> Result<ImportReport, ImportError> {
        self.bookmarks.execute().await
    }

    pub async fn copy_media(&self) -> ImportReport {
        self.media.execute().await
    }

    /// Cache journals, archive posts and bookmarks, then copy media
    pub async fn run_all(&self, force: bool) -> Result<ImportReport, ImportError> {
        let mut report = self.populate(force).await?;
        info!("{}", report.summary());

        let blogs = self.import_blogs().await?;
        info!("{}", blogs.summary());
        report.merge(blogs);

        let bookmarks = self.import_bookmarks().await?;
        info!("{}", bookmarks.summary());
        report.merge(bookmarks);

        let media = self.copy_media().await;
        info!(copied = media.media_files_copied, "Media copied");
        report.merge(media);

        Ok(report)
    }
}
