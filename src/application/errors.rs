//! Error types for sources and use cases

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::application::ports::StorageError;
use crate::domain::errors::DomainError;

/// A whole source could not be read.
///
/// Row-level problems never surface here; adapters count them in their batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SourceError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        SourceError::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Errors that abort a use case
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_mentions_path() {
        let err = SourceError::parse("/in/pinboard.json", "expected array");
        assert!(err.to_string().contains("/in/pinboard.json"));
        assert!(err.to_string().contains("expected array"));
    }

    #[test]
    fn test_import_error_from_storage_error() {
        let storage_err = StorageError::Internal("disk full".to_string());
        let err: ImportError = storage_err.into();

        assert!(matches!(err, ImportError::Storage(_)));
        assert!(err.to_string().contains("Storage error"));
    }

    #[test]
    fn test_import_error_from_domain_error() {
        let err: ImportError = DomainError::validation("name", "too long").into();
        assert!(matches!(err, ImportError::Domain(_)));
    }

    #[test]
    fn test_source_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = SourceError::io("/in/favorites.html", io);
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("missing"));
    }
}
