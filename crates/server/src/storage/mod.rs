use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub mod filesystem;
pub mod path;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {path}")]
    NotFound { path: String },
    #[error("object already exists: {path}")]
    AlreadyExists { path: String },
    #[error("invalid storage path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("invalid public url: {0}")]
    Url(#[from] url::ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Bucket-relative object key, e.g. `public/<resource id>/notes.pdf`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new<S: Into<String>>(path: S) -> Result<Self, StorageError> {
        let path = path.into();
        let invalid = |reason: &str| StorageError::InvalidPath {
            path: path.clone(),
            reason: reason.to_string(),
        };
        if path.is_empty() {
            return Err(invalid("path is empty"));
        }
        if path.contains('\\') {
            return Err(invalid("backslashes are not allowed"));
        }
        for segment in path.split('/') {
            match segment {
                "" => return Err(invalid("empty path segment")),
                "." | ".." => return Err(invalid("relative path segments are not allowed")),
                _ => {}
            }
        }
        Ok(Self(path))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub path: StoragePath,
    pub public_url: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a new object. Existing objects are never overwritten.
    async fn upload(&self, path: &StoragePath, bytes: &[u8]) -> Result<StoredObject, StorageError>;

    async fn remove(&self, path: &StoragePath) -> Result<(), StorageError>;

    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn upload(&self, path: &StoragePath, bytes: &[u8]) -> Result<StoredObject, StorageError> {
        (**self).upload(path, bytes).await
    }

    async fn remove(&self, path: &StoragePath) -> Result<(), StorageError> {
        (**self).remove(path).await
    }

    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError> {
        (**self).read(path).await
    }
}
