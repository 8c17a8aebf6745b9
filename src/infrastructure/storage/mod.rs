mod atomic_file;
mod file_archive_sink;
mod json_record_cache;
mod path_builder;

pub use atomic_file::{copy_atomic, write_atomic};
pub use file_archive_sink::{render_csv, render_markdown, render_ndjson, FileArchiveSink};
pub use json_record_cache::JsonRecordCache;
pub use path_builder::PathBuilder;
