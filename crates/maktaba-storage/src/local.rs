//! Local filesystem storage backend.

use crate::traits::{ByteStream, FileMetadata, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

/// Local filesystem storage rooted at a private upload directory.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the root directory when
    /// missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that would
    /// escape the upload root.
    ///
    /// Both sides are canonicalized before comparison so a sibling directory
    /// like `/uploads-evil` cannot pass a raw prefix check against
    /// `/uploads`.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains('\0')
        {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        // The file itself may not exist yet (save path); canonicalize the
        // nearest existing ancestor instead and check that.
        let mut probe = path.clone();
        let canonical_ancestor = loop {
            match probe.canonicalize() {
                Ok(c) => break c,
                Err(_) => match probe.parent() {
                    Some(parent) => probe = parent.to_path_buf(),
                    None => {
                        return Err(StorageError::InvalidKey(
                            "Storage key resolves outside storage directory".to_string(),
                        ))
                    }
                },
            }
        };

        if canonical_ancestor.strip_prefix(&base_canonical).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn open_regular_file(&self, storage_key: &str) -> StorageResult<(fs::File, u64)> {
        let path = self.key_to_path(storage_key)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(storage_key.to_string()))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        Ok((file, meta.len()))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(size)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::debug!(key = %storage_key, "Local storage delete successful");
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(_) => Ok(false),
        }
    }

    async fn stat(&self, storage_key: &str) -> StorageResult<FileMetadata> {
        let (_file, size) = self.open_regular_file(storage_key).await?;
        Ok(FileMetadata { size })
    }

    async fn read_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let (file, _size) = self.open_regular_file(storage_key).await?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn read_range(
        &self,
        storage_key: &str,
        start: u64,
        end: u64,
    ) -> StorageResult<ByteStream> {
        let (mut file, size) = self.open_regular_file(storage_key).await?;
        if start > end || end >= size {
            return Err(StorageError::ReadFailed(format!(
                "Range {}-{} out of bounds for {} bytes",
                start, end, size
            )));
        }

        file.seek(std::io::SeekFrom::Start(start)).await?;
        let len = end - start + 1;
        Ok(ReaderStream::new(file.take(len)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn save_stat_and_read_back() {
        let (_dir, storage) = storage().await;
        let data = b"%PDF-1.4 minimal".to_vec();
        let written = storage.save("books/1/a.pdf", data.clone()).await.unwrap();
        assert_eq!(written, data.len() as u64);

        let meta = storage.stat("books/1/a.pdf").await.unwrap();
        assert_eq!(meta.size, data.len() as u64);

        let body = collect(storage.read_stream("books/1/a.pdf").await.unwrap()).await;
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn read_range_returns_exact_slice() {
        let (_dir, storage) = storage().await;
        let data: Vec<u8> = (0..=255).collect();
        storage.save("videos/9/v.mp4", data.clone()).await.unwrap();

        let body = collect(storage.read_range("videos/9/v.mp4", 10, 20).await.unwrap()).await;
        assert_eq!(body, &data[10..=20]);

        // tail range
        let body = collect(storage.read_range("videos/9/v.mp4", 250, 255).await.unwrap()).await;
        assert_eq!(body, &data[250..=255]);
    }

    #[tokio::test]
    async fn read_range_rejects_out_of_bounds() {
        let (_dir, storage) = storage().await;
        storage.save("books/2/b.pdf", vec![0u8; 100]).await.unwrap();
        assert!(storage.read_range("books/2/b.pdf", 50, 100).await.is_err());
        assert!(storage.read_range("books/2/b.pdf", 60, 50).await.is_err());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, storage) = storage().await;
        for key in ["../outside.pdf", "books/../../etc/passwd", "/etc/passwd", ""] {
            let err = storage.stat(key).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key: {key:?}");
        }
    }

    #[tokio::test]
    async fn stat_missing_file_is_not_found() {
        let (_dir, storage) = storage().await;
        let err = storage.stat("books/404/missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, storage) = storage().await;
        storage.save("books/3/c.pdf", vec![1, 2, 3]).await.unwrap();
        storage.delete("books/3/c.pdf").await.unwrap();
        storage.delete("books/3/c.pdf").await.unwrap();
        assert!(!storage.exists("books/3/c.pdf").await.unwrap());
    }
}
