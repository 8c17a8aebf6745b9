use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while interpreting fixed-width integer fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Truncated field: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Unsupported integer width: {0} bytes")]
    UnsupportedWidth(usize),

    #[error("Timestamp out of range: {0} seconds")]
    TimestampOutOfRange(u64),
}

/// Errors raised while decoding a single semagic buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Expected at least {expected} delimited chunks, found {found}")]
    ChunkCount { expected: usize, found: usize },

    #[error("Field '{field}' could not be decoded: {source}")]
    Codec {
        field: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("Field '{field}' is not valid UTF-16LE")]
    InvalidUtf16 { field: &'static str },

    #[error("Field '{field}' value {value} does not fit the entry")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("Layout does not provide field '{0}'")]
    MissingField(&'static str),

    #[error("Layout decodes field '{field}' as {kind}, which it cannot hold")]
    KindMismatch {
        field: &'static str,
        kind: &'static str,
    },
}

/// A decode failure tied to the file it came from.
///
/// Batch callers log this at warning level and move on to the next file.
#[derive(Debug, Clone, Error)]
#[error("Failed to decode {}: {source}", .path.display())]
pub struct FileDecodeError {
    pub path: PathBuf,
    #[source]
    pub source: DecodeError,
}

impl FileDecodeError {
    pub fn new(path: impl Into<PathBuf>, source: DecodeError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_decode_error_mentions_path() {
        let err = FileDecodeError::new(
            "/tmp/posts/0042.slj",
            DecodeError::ChunkCount {
                expected: 19,
                found: 3,
            },
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/posts/0042.slj"));
        assert!(message.contains("19"));
    }

    #[test]
    fn test_codec_error_display() {
        let err = DecodeError::Codec {
            field: "date",
            source: CodecError::Truncated {
                expected: 4,
                actual: 1,
            },
        };
        assert!(err.to_string().contains("date"));
        assert!(err.to_string().contains("expected 4 bytes"));
    }
}
