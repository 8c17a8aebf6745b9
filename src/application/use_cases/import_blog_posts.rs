use std::sync::Arc;

use tracing::{info, warn};

use crate::application::errors::ImportError;
use crate::application::ports::ArchiveSink;
use crate::application::report::ImportReport;
use crate::application::sources::PostSource;
use crate::domain::entities::ArchivedPost;
use crate::domain::markup::{autop, BodyFormat, UnconvertibleBodyPolicy};

/// Use case: write every blog post from every post source to the archive
pub struct ImportBlogPostsUseCase {
    sources: Vec<Arc<dyn PostSource>>,
    sink: Arc<dyn ArchiveSink>,
    unconvertible_body: UnconvertibleBodyPolicy,
}

impl ImportBlogPostsUseCase {
    pub fn new(
        sources: Vec<Arc<dyn PostSource>>,
        sink: Arc<dyn ArchiveSink>,
        unconvertible_body: UnconvertibleBodyPolicy,
    ) -> Self {
        Self {
            sources,
            sink,
            unconvertible_body,
        }
    }

    pub async fn execute(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::new();

        for source in &self.sources {
            let batch = match source.collect().await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Post source failed");
                    report.add_error(format!("{}: {}", source.name(), e));
                    continue;
                }
            };
            report.invalid_records += batch.invalid;

            let mut written = 0;
            for post in batch.records {
                let Some(post) = self.prepare(post) else {
                    report.invalid_records += 1;
                    continue;
                };
                self.sink.write_post(&post).await?;
                written += 1;
            }

            report.records_written += written;
            info!(source = source.name(), written, "Posts archived");
        }

        Ok(report)
    }

    /// Convert what can be converted; apply the policy to the rest
    fn prepare(&self, mut post: ArchivedPost) -> Option<ArchivedPost> {
        if !post.format.is_convertible() {
            match self.unconvertible_body {
                UnconvertibleBodyPolicy::Skip => {
                    warn!(id = %post.id, format = ?post.format, "Skipping post with borked body");
                    return None;
                }
                UnconvertibleBodyPolicy::Raw => {
                    warn!(id = %post.id, format = ?post.format, "Keeping unconverted body");
                }
            }
        }

        if post.format == BodyFormat::Text {
            post.body = autop(&post.body);
            post.format = BodyFormat::Html;
        }
        Some(post)
    }
}
