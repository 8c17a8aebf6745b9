use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::application::ports::{ArchiveSink, MediaCollection, StorageError};
use crate::domain::entities::{ArchivedPost, CanonicalBookmark, CommentThread};
use crate::infrastructure::storage::{copy_atomic, write_atomic, PathBuilder};

const CSV_HEADER: [&str; 7] = [
    "identifier",
    "sharedContent",
    "name",
    "description",
    "created",
    "keywords",
    "partOf",
];

/// Archive written as Markdown posts plus bookmark NDJSON/CSV files
pub struct FileArchiveSink {
    path_builder: PathBuilder,
    durable_writes: bool,
}

impl FileArchiveSink {
    pub fn new(path_builder: PathBuilder) -> Self {
        Self::with_durability(path_builder, false)
    }

    pub fn with_durability(path_builder: PathBuilder, durable_writes: bool) -> Self {
        Self {
            path_builder,
            durable_writes,
        }
    }
}

/// `---` fenced YAML front matter followed by the body
pub fn render_markdown(post: &ArchivedPost) -> Result<String, StorageError> {
    let front_matter = serde_yaml::to_string(post)?;
    Ok(format!("---\n{}---\n\n{}\n", front_matter, post.body.trim_end()))
}

pub fn render_ndjson(bookmarks: &[CanonicalBookmark]) -> Result<Vec<u8>, StorageError> {
    let mut out = Vec::new();
    for bookmark in bookmarks {
        serde_json::to_writer(&mut out, bookmark)?;
        out.push(b'\n');
    }
    Ok(out)
}

pub fn render_csv(bookmarks: &[CanonicalBookmark]) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for bookmark in bookmarks {
        let created = bookmark
            .created()
            .map(|c| c.to_rfc3339())
            .unwrap_or_default();
        writer.write_record([
            bookmark.identifier().as_hex(),
            bookmark.shared_content().as_str(),
            bookmark.name().unwrap_or_default(),
            bookmark.description().unwrap_or_default(),
            created.as_str(),
            bookmark.keywords().join(",").as_str(),
            bookmark.part_of().as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| StorageError::Internal(format!("Failed to flush CSV: {}", e)))
}

/// Every file below `root`, sorted, with its `/`-separated relative path
async fn files_below(root: &Path) -> Result<Vec<(PathBuf, String)>, StorageError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
                continue;
            }
            let relative = path
                .strip_prefix(root)
                .map_err(|e| StorageError::Internal(e.to_string()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((path, relative));
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

#[async_trait]
impl ArchiveSink for FileArchiveSink {
    async fn write_post(&self, post: &ArchivedPost) -> Result<(), StorageError> {
        let path = self.path_builder.post(post.year(), &post.id)?;
        write_atomic(&path, render_markdown(post)?.as_bytes(), self.durable_writes).await?;

        if !post.comments.is_empty() {
            let comments_path = self.path_builder.comments(&post.id)?;
            let contents = serde_json::to_vec_pretty(&post.comments)?;
            write_atomic(&comments_path, &contents, self.durable_writes).await?;
        }

        debug!("Archived post {} to {:?}", post.id, path);
        Ok(())
    }

    async fn write_thread(&self, thread: &CommentThread) -> Result<(), StorageError> {
        let path = self.path_builder.comments(&thread.archive_id())?;
        let contents = serde_json::to_vec_pretty(thread)?;
        write_atomic(&path, &contents, self.durable_writes).await?;

        debug!("Archived thread {} with {} comments", thread.id, thread.comments.len());
        Ok(())
    }

    async fn write_bookmarks(&self, bookmarks: &[CanonicalBookmark]) -> Result<(), StorageError> {
        let ndjson = render_ndjson(bookmarks)?;
        write_atomic(&self.path_builder.bookmarks_ndjson(), &ndjson, self.durable_writes).await?;

        let csv = render_csv(bookmarks)?;
        write_atomic(&self.path_builder.bookmarks_csv(), &csv, self.durable_writes).await?;

        info!(count = bookmarks.len(), "Bookmarks written");
        Ok(())
    }

    async fn copy_media(&self, collection: &MediaCollection) -> Result<Option<usize>, StorageError> {
        let target = self.path_builder.media(&collection.target)?;
        match fs::metadata(&collection.source).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StorageError::Internal(format!(
                    "Media source {:?} is not a directory",
                    collection.source
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut copied = 0;
        for (path, relative) in files_below(&collection.source).await? {
            if collection.excludes(&relative) {
                debug!("Media file {} excluded", relative);
                continue;
            }
            copy_atomic(&path, &target.join(&relative), self.durable_writes).await?;
            copied += 1;
        }

        info!(target = %collection.target, copied, "Media copied");
        Ok(Some(copied))
    }
}
