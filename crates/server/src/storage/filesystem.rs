//! Filesystem-backed blob storage, one file per object under the root dir.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::StorageConfig;
use crate::storage::path::public_url;
use crate::storage::{BlobStore, StorageError, StoragePath, StoredObject};

pub struct FilesystemBlobStore {
    root_dir: PathBuf,
    bucket: String,
    public_base_url: Url,
}

impl FilesystemBlobStore {
    pub fn new(root_dir: PathBuf, bucket: String, public_base_url: Url) -> Self {
        Self {
            root_dir,
            bucket,
            public_base_url,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self::new(
            config.root_dir.clone(),
            config.bucket.clone(),
            Url::parse(&config.public_base_url)?,
        ))
    }

    fn object_path(&self, path: &StoragePath) -> PathBuf {
        path.segments()
            .fold(self.root_dir.join(&self.bucket), |acc, segment| acc.join(segment))
    }

    fn map_io_error(path: &StoragePath, e: std::io::Error) -> StorageError {
        match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                path: path.to_string(),
            },
            ErrorKind::AlreadyExists => StorageError::AlreadyExists {
                path: path.to_string(),
            },
            _ => StorageError::Io(e),
        }
    }
}

/// Writes a freshly created object, removing it again if the write fails.
async fn write_or_discard<W: AsyncWrite + Unpin>(
    mut file: W,
    target: &Path,
    bytes: &[u8],
) -> Result<(), StorageError> {
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;
    let Err(e) = written else {
        return Ok(());
    };
    drop(file);
    if let Err(cleanup) = tokio::fs::remove_file(target).await {
        warn!("failed to remove partial object at {}: {cleanup}", target.display());
    }
    Err(e.into())
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, path: &StoragePath, bytes: &[u8]) -> Result<StoredObject, StorageError> {
        let target = self.object_path(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| Self::map_io_error(path, e))?;
        write_or_discard(file, &target, bytes).await?;
        debug!("stored object at {}", target.display());
        Ok(StoredObject {
            path: path.clone(),
            public_url: public_url(&self.public_base_url, &self.bucket, path)?,
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &StoragePath) -> Result<(), StorageError> {
        let target = self.object_path(path);
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| Self::map_io_error(path, e))?;
        debug!("removed object at {}", target.display());
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(self.object_path(path))
            .await
            .map_err(|e| Self::map_io_error(path, e))
    }
}
