//! In-memory stand-ins for the document and blob stores.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::Error as SqlxError;
use url::Url;

use crate::catalog::store::{ResourceStore, RowDeletion};
use crate::models::resource::{FileAttachment, Resource, ResourceId, ResourceType};
use crate::storage::path::public_url;
use crate::storage::{BlobStore, StorageError, StoragePath, StoredObject};

pub const BUCKET: &str = "resource-files";
pub const PUBLIC_BASE_URL: &str = "http://localhost:8080/files";

pub fn sample_resource(name: &str, file_url: Option<String>) -> Resource {
    let file = file_url.map(|url| {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("attachment.pdf")
            .to_string();
        FileAttachment {
            file_url: url,
            file_name,
            file_mime_type: Some("application/pdf".to_string()),
            file_size_bytes: Some(3),
        }
    });
    Resource {
        id: ResourceId::new_v4(),
        name: name.to_string(),
        resource_type: ResourceType::LectureNotes,
        course: "PHY301".to_string(),
        year: 2023,
        description: format!("{name} for the autumn term"),
        keywords: vec!["notes".to_string()],
        file,
        uploader_id: Some(1),
    }
}

#[derive(Default)]
pub struct MemoryResourceStore {
    resources: Mutex<Vec<Resource>>,
    delete_calls: Mutex<Vec<ResourceId>>,
    delete_failure: Mutex<Option<SqlxError>>,
    delete_delay: Mutex<Option<Duration>>,
    insert_failure: Mutex<Option<String>>,
}

impl MemoryResourceStore {
    pub fn with_resources(resources: Vec<Resource>) -> Self {
        Self {
            resources: Mutex::new(resources),
            ..Default::default()
        }
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.resources.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.lock().unwrap().is_empty()
    }

    pub fn delete_calls(&self) -> Vec<ResourceId> {
        self.delete_calls.lock().unwrap().clone()
    }

    /// Fails the next delete with a driver-level error.
    pub fn fail_deletes_with(&self, message: &str) {
        *self.delete_failure.lock().unwrap() = Some(SqlxError::Protocol(message.to_string()));
    }

    /// Fails deletes the way Postgres rejects a statement.
    pub fn reject_deletes_with(&self, message: &str) {
        *self.delete_failure.lock().unwrap() =
            Some(SqlxError::Database(Box::new(DatabaseRejection::new(message))));
    }

    pub fn delay_deletes_by(&self, delay: Duration) {
        *self.delete_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_inserts_with(&self, message: &str) {
        *self.insert_failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn list_resources(&self) -> Result<Vec<Resource>, SqlxError> {
        Ok(self.resources())
    }

    async fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>, SqlxError> {
        Ok(self.resources().into_iter().find(|r| r.id == *id))
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<(), SqlxError> {
        if let Some(message) = self.insert_failure.lock().unwrap().clone() {
            return Err(SqlxError::Protocol(message));
        }
        self.resources.lock().unwrap().push(resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<RowDeletion, SqlxError> {
        self.delete_calls.lock().unwrap().push(*id);
        let delay = *self.delete_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.delete_failure.lock().unwrap().take() {
            return Err(e);
        }
        let mut resources = self.resources.lock().unwrap();
        let before = resources.len();
        resources.retain(|r| r.id != *id);
        if resources.len() < before {
            Ok(RowDeletion::Deleted)
        } else {
            Ok(RowDeletion::AlreadyAbsent)
        }
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<StoragePath, Vec<u8>>>,
    remove_calls: Mutex<Vec<StoragePath>>,
    upload_failure: Mutex<Option<String>>,
    removal_failure: Mutex<Option<String>>,
}

impl MemoryBlobStore {
    fn public_url(path: &StoragePath) -> String {
        let base = Url::parse(PUBLIC_BASE_URL).unwrap();
        public_url(&base, BUCKET, path).unwrap()
    }

    /// Seeds an object directly, returning its public url.
    pub fn put(&self, path: &StoragePath, bytes: &[u8]) -> String {
        self.objects
            .lock()
            .unwrap()
            .insert(path.clone(), bytes.to_vec());
        Self::public_url(path)
    }

    pub fn contains(&self, path: &StoragePath) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    pub fn remove_calls(&self) -> Vec<StoragePath> {
        self.remove_calls.lock().unwrap().clone()
    }

    pub fn fail_uploads_with(&self, message: &str) {
        *self.upload_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_removals_with(&self, message: &str) {
        *self.removal_failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &StoragePath, bytes: &[u8]) -> Result<StoredObject, StorageError> {
        if let Some(message) = self.upload_failure.lock().unwrap().clone() {
            return Err(io::Error::other(message).into());
        }
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(path) {
            return Err(StorageError::AlreadyExists {
                path: path.to_string(),
            });
        }
        objects.insert(path.clone(), bytes.to_vec());
        Ok(StoredObject {
            path: path.clone(),
            public_url: Self::public_url(path),
        })
    }

    async fn remove(&self, path: &StoragePath) -> Result<(), StorageError> {
        self.remove_calls.lock().unwrap().push(path.clone());
        if let Some(message) = self.removal_failure.lock().unwrap().clone() {
            return Err(io::Error::other(message).into());
        }
        match self.objects.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_string(),
            })
    }
}

/// Server-side statement rejection, as carried by `sqlx::Error::Database`.
#[derive(Debug)]
pub struct DatabaseRejection {
    message: String,
}

impl DatabaseRejection {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for DatabaseRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for DatabaseRejection {}

impl DatabaseError for DatabaseRejection {
    fn message(&self) -> &str {
        &self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("42501"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}
