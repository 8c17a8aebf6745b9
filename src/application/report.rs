/// Counters reported at the end of an import run.
///
/// Every record that did not make it to the archive lands in exactly one
/// counter, so nothing is dropped silently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Records written to the cache or the archive
    pub records_written: usize,
    /// Bookmarks discarded because an earlier source already had the URL
    pub duplicates_rejected: usize,
    /// Records dropped because their URL could not be normalised
    pub urls_skipped: usize,
    /// Records that failed validation or had an unusable body
    pub invalid_records: usize,
    /// Binary files that could not be decoded
    pub decode_failures: usize,
    /// Sources not run because their cache partition was already filled
    pub sources_skipped: usize,
    /// Media files mirrored into the archive
    pub media_files_copied: usize,
    /// Sources that failed as a whole.
    ///
    /// The run continues with the next source.
    pub errors: Vec<String>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no source failed as a whole
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn rejected_total(&self) -> usize {
        self.duplicates_rejected + self.urls_skipped + self.invalid_records + self.decode_failures
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn merge(&mut self, other: ImportReport) {
        self.records_written += other.records_written;
        self.duplicates_rejected += other.duplicates_rejected;
        self.urls_skipped += other.urls_skipped;
        self.invalid_records += other.invalid_records;
        self.decode_failures += other.decode_failures;
        self.sources_skipped += other.sources_skipped;
        self.media_files_copied += other.media_files_copied;
        self.errors.extend(other.errors);
    }

    pub fn summary(&self) -> String {
        let counts = format!(
            "{} written, {} duplicates rejected, {} URLs skipped, {} invalid, {} decode failures",
            self.records_written,
            self.duplicates_rejected,
            self.urls_skipped,
            self.invalid_records,
            self.decode_failures
        );
        if self.errors.is_empty() {
            format!("Import completed: {}", counts)
        } else {
            format!(
                "Import completed with {} errors: {}",
                self.errors.len(),
                counts
            )
        }
    }

    pub fn details(&self) -> String {
        let mut details = vec![
            format!("Records written: {}", self.records_written),
            format!("Duplicates rejected: {}", self.duplicates_rejected),
            format!("URLs skipped: {}", self.urls_skipped),
            format!("Invalid records: {}", self.invalid_records),
            format!("Decode failures: {}", self.decode_failures),
            format!("Sources skipped (cached): {}", self.sources_skipped),
            format!("Media files copied: {}", self.media_files_copied),
            format!("Errors encountered: {}", self.errors.len()),
        ];

        if !self.errors.is_empty() {
            details.push("Errors:".to_string());
            for (i, error) in self.errors.iter().enumerate() {
                details.push(format!("  {}. {}", i + 1, error));
            }
        }

        details.join("\n")
    }
}
