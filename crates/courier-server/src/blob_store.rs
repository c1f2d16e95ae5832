//! On-disk storage for decoded media payloads.
//!
//! Blobs are written under generated `<uuid><ext>` names and never mutated
//! or deleted by the relay.  There is no transactional link to the message
//! log: the relay writes the blob first and appends the log second, so a
//! crash in between leaves an orphaned file rather than a message row
//! pointing at nothing.

use std::path::PathBuf;

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct BlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl BlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::MediaStorage(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Media blob store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Write a decoded media payload under a fresh collision-resistant
    /// name.  Returns the filename clients use to fetch it back.
    pub async fn store(&self, data: &[u8], extension: &str) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::MediaStorage("Empty media payload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::MediaTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let filename = format!("{}{}", Uuid::new_v4(), extension);
        let path = self.base_path.join(&filename);

        fs::write(&path, data).await.map_err(|e| {
            ServerError::MediaStorage(format!("Failed to write blob {}: {}", filename, e))
        })?;

        debug!(file = %filename, size = data.len(), "Stored media blob");
        Ok(filename)
    }

    /// Read a blob back by the filename handed out by [`store`].
    ///
    /// The filename arrives from the client, so it is validated against
    /// path traversal before touching disk.
    ///
    /// [`store`]: BlobStore::store
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, ServerError> {
        let path = self.safe_path(filename)?;

        if !path.exists() {
            return Err(ServerError::MediaNotFound(filename.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            ServerError::MediaStorage(format!("Failed to read blob {}: {}", filename, e))
        })?;

        debug!(file = %filename, size = data.len(), "Retrieved media blob");
        Ok(data)
    }

    /// Reject any filename that could escape the media directory.
    fn safe_path(&self, filename: &str) -> Result<PathBuf, ServerError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ServerError::BadRequest(
                "Path traversal detected".to_string(),
            ));
        }
        Ok(self.base_path.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (BlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_and_read() {
        let (store, _dir) = test_store().await;

        let filename = store.store(b"png-bytes", ".png").await.unwrap();
        assert!(filename.ends_with(".png"));

        let data = store.read(&filename).await.unwrap();
        assert_eq!(data, b"png-bytes");
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let (store, _dir) = test_store().await;

        let a = store.store(b"one", ".bin").await.unwrap();
        let b = store.store(b"two", ".bin").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_payload_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store(b"", ".png").await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().to_path_buf(), 4).await.unwrap();

        assert!(matches!(
            store.store(b"too big", ".bin").await,
            Err(ServerError::MediaTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;

        assert!(store.read("../etc/passwd").await.is_err());
        assert!(store.read("a/b.png").await.is_err());
        assert!(store.read("").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.read("does-not-exist.png").await,
            Err(ServerError::MediaNotFound(_))
        ));
    }
}
