use std::path::Path;

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::application::ports::StorageError;
use crate::infrastructure::storage::PathBuilder;

/// Write `contents` to `path` through a temp file and an atomic rename.
///
/// Readers never see a half-written file. With `durable` set the data is
/// synced before the rename.
pub async fn write_atomic(path: &Path, contents: &[u8], durable: bool) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = PathBuilder::temp_for(path);
    debug!("Writing {} bytes to {:?}", contents.len(), temp_path);

    let result = async {
        let mut file = File::create(&temp_path).await?;
        file.write_all(contents).await?;
        if durable {
            file.sync_all().await?;
        }
        fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        warn!("Failed to write {:?}: {}", path, e);
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

/// Copy `source` to `path` with the same temp-file-then-rename discipline
pub async fn copy_atomic(source: &Path, path: &Path, durable: bool) -> Result<u64, StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = PathBuilder::temp_for(path);
    let result = async {
        let bytes = fs::copy(source, &temp_path).await?;
        if durable {
            File::open(&temp_path).await?.sync_all().await?;
        }
        fs::rename(&temp_path, path).await?;
        Ok::<_, std::io::Error>(bytes)
    }
    .await;

    match result {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            warn!("Failed to copy {:?} to {:?}: {}", source, path, e);
            let _ = fs::remove_file(&temp_path).await;
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/record.json");

        write_atomic(&path, b"{}", true).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert!(!PathBuilder::temp_for(&path).exists());
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.txt");

        write_atomic(&path, b"first", false).await.unwrap();
        write_atomic(&path, b"second", false).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_copy_atomic_mirrors_contents() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let path = dir.path().join("media/mt/photo.jpg");

        let bytes = copy_atomic(&source, &path, false).await.unwrap();

        assert_eq!(bytes, 10);
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");
        assert!(!PathBuilder::temp_for(&path).exists());
    }

    #[tokio::test]
    async fn test_copy_atomic_missing_source_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/missing.jpg");

        assert!(copy_atomic(&dir.path().join("missing.jpg"), &path, false).await.is_err());
        assert!(!path.exists());
        assert!(!PathBuilder::temp_for(&path).exists());
    }
}
