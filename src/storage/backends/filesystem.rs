use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::StoreError;
use crate::storage::{StorageBackend, StoredObject};

pub struct FileSystemBackend {
    directory: PathBuf,
}

impl FileSystemBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { directory: dir }
    }

    /// Keys must stay inside the storage directory.
    fn format_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        Ok(self.directory.join(key))
    }
}

#[async_trait]
impl StorageBackend for FileSystemBackend {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
        _public: bool,
    ) -> Result<StoredObject, StoreError> {
        let path = self.format_path(key)?;

        debug!("Storing image @ {:?}", &path);
        match tokio::fs::write(&path, &body).await {
            Ok(()) => {},
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, body).await?;
            },
            Err(other) => return Err(other.into()),
        }

        Ok(StoredObject {
            location: format!("file://{}", path.display()),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.format_path(key)?;

        debug!("Purging image @ {:?}", &path);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_creates_nested_directories() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = FileSystemBackend::new(dir.path().to_path_buf());

        let stored = backend
            .put("uploads/posts/1/abc_url.jpg", Bytes::from_static(b"jpeg"), "image/jpeg", false)
            .await?;

        let path = dir.path().join("uploads/posts/1/abc_url.jpg");
        assert_eq!(tokio::fs::read(&path).await?, b"jpeg");
        assert_eq!(stored.location, format!("file://{}", path.display()));

        Ok(())
    }

    #[tokio::test]
    async fn test_put_overwrites() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = FileSystemBackend::new(dir.path().to_path_buf());

        backend.put("a_url.jpg", Bytes::from_static(b"first"), "image/jpeg", false).await?;
        backend.put("a_url.jpg", Bytes::from_static(b"second"), "image/jpeg", false).await?;

        assert_eq!(tokio::fs::read(dir.path().join("a_url.jpg")).await?, b"second");

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let backend = FileSystemBackend::new(dir.path().to_path_buf());

        backend.put("a_thumb.jpg", Bytes::from_static(b"jpeg"), "image/jpeg", false).await?;
        backend.delete("a_thumb.jpg").await?;
        assert!(!dir.path().join("a_thumb.jpg").exists());

        backend.delete("a_thumb.jpg").await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let backend = FileSystemBackend::new(PathBuf::from("/tmp/unused"));

        let result = backend.delete("../outside_url.jpg").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));

        let result = backend
            .put("/etc/a_url.jpg", Bytes::new(), "image/jpeg", false)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }
}
