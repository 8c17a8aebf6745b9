mod archive_sink;
mod record_cache;

pub use archive_sink::{ArchiveSink, MediaCollection};
pub use record_cache::{CacheKey, CachedRecord, RecordCache, StorageError};

#[cfg(test)]
pub use archive_sink::MockArchiveSink;
#[cfg(test)]
pub use record_cache::MockRecordCache;
