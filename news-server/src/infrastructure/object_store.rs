use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub(crate) enum ObjectStoreError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Bucket holding uploaded images. Objects are write-once.
#[async_trait]
pub(crate) trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: &[u8], content_type: &str)
    -> Result<(), ObjectStoreError>;

    fn public_url(&self, key: &str) -> String;
}

#[async_trait]
impl<T> ObjectStore for Arc<T>
where
    T: ObjectStore + ?Sized,
{
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        (**self).put(key, data, content_type).await
    }

    fn public_url(&self, key: &str) -> String {
        (**self).public_url(key)
    }
}

/// Filesystem bucket served back by the HTTP server under `/uploads`.
#[derive(Debug, Clone)]
pub(crate) struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub(crate) const PUBLIC_PREFIX: &'static str = "/uploads";

    pub(crate) fn new(root: PathBuf, public_base_url: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let path = self.resolve(key)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(ObjectStoreError::AlreadyExists(key.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = file.write_all(data).await {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(err.into());
        }
        file.flush().await?;

        tracing::debug!(key, content_type, size = data.len(), "object stored");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{}/{key}", self.public_base_url, Self::PUBLIC_PREFIX)
    }
}
