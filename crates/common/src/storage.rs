//! Blob storage for uploaded recipe images.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Metadata about a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Storage key (relative path).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a blob under `key`, replacing any previous content.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Delete a blob. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("foodgram-{}", uuid::Uuid::new_v4().simple()));
        (LocalStorage::new(dir.clone(), "/media/".to_string()), dir)
    }

    #[test]
    fn test_public_url_joins_without_double_slash() {
        let (storage, _) = temp_storage();
        assert_eq!(
            storage.public_url("recipes/images/a.png"),
            "/media/recipes/images/a.png"
        );
    }

    #[tokio::test]
    async fn test_save_exists_delete() {
        let (storage, dir) = temp_storage();

        let stored = storage.save("recipes/images/r1.png", b"data").await.unwrap();
        assert_eq!(stored.size, 4);
        assert_eq!(stored.url, "/media/recipes/images/r1.png");
        assert!(storage.exists("recipes/images/r1.png").await.unwrap());

        storage.delete("recipes/images/r1.png").await.unwrap();
        assert!(!storage.exists("recipes/images/r1.png").await.unwrap());

        // deleting twice is fine
        storage.delete("recipes/images/r1.png").await.unwrap();

        tokio::fs::remove_dir_all(dir).await.ok();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (storage, _) = temp_storage();
        let result = storage.save("../escape.png", b"x").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
