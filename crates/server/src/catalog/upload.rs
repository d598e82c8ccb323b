use tracing::{info, instrument, warn};

use crate::catalog::notice::Notice;
use crate::catalog::store::{store_error_message, ResourceStore};
use crate::error::RequestError;
use crate::models::resource::{FileAttachment, Resource, ResourceId, UploadFile, UploadResource};
use crate::models::user::UserId;
use crate::storage::{BlobStore, StorageError, StoragePath};

/// Leading segment of every uploaded object key.
pub const UPLOAD_PREFIX: &str = "public";

pub fn upload_path(id: &ResourceId, file_name: &str) -> Result<StoragePath, StorageError> {
    let id = id.to_string();
    StoragePath::from_segments([UPLOAD_PREFIX, id.as_str(), file_name])
}

#[derive(Clone, Debug)]
pub struct UploadReport {
    pub resource: Resource,
    pub notice: Notice,
}

pub struct Uploader<'a> {
    store: &'a dyn ResourceStore,
    blobs: &'a dyn BlobStore,
}

impl<'a> Uploader<'a> {
    pub fn new(store: &'a dyn ResourceStore, blobs: &'a dyn BlobStore) -> Self {
        Self { store, blobs }
    }

    /// Stores the file first, then inserts the row referencing it. Any remote
    /// failure aborts the upload with the remote message.
    #[instrument(skip_all, fields(name = %request.name))]
    pub async fn upload(
        &self,
        uploader_id: UserId,
        request: UploadResource,
    ) -> Result<UploadReport, RequestError> {
        let id = ResourceId::new_v4();
        let (stored_path, file) = match &request.file {
            Some(file) => {
                let (path, attachment) = self.store_file(&id, file).await?;
                (Some(path), Some(attachment))
            }
            None => (None, None),
        };
        let resource = Resource {
            id,
            name: request.name,
            resource_type: request.resource_type,
            course: request.course,
            year: request.year,
            description: request.description,
            keywords: request.keywords,
            file,
            uploader_id: Some(uploader_id),
        };

        if let Err(e) = self.store.insert_resource(&resource).await {
            if let Some(path) = &stored_path {
                self.discard_file(path).await;
            }
            return Err(RequestError::RemoteWrite {
                title: "Resource Creation Failed",
                message: store_error_message(&e),
            });
        }
        info!("resource {} uploaded", resource.id);
        let notice = Notice::success(
            "Resource Uploaded!",
            format!("\"{}\" has been added.", resource.name),
        );
        Ok(UploadReport { resource, notice })
    }

    async fn store_file(
        &self,
        id: &ResourceId,
        file: &UploadFile,
    ) -> Result<(StoragePath, FileAttachment), RequestError> {
        let path = upload_path(id, &file.file_name)?;
        let stored = self
            .blobs
            .upload(&path, &file.bytes)
            .await
            .map_err(|e| RequestError::RemoteWrite {
                title: "File Upload Failed",
                message: e.to_string(),
            })?;
        let attachment = FileAttachment {
            file_url: stored.public_url,
            file_name: file.file_name.clone(),
            file_mime_type: file.mime_type.clone(),
            file_size_bytes: Some(file.bytes.len() as i64),
        };
        Ok((path, attachment))
    }

    async fn discard_file(&self, path: &StoragePath) {
        match self.blobs.remove(path).await {
            Ok(()) => info!("discarded orphaned file `{path}`"),
            Err(e) => warn!("failed to discard orphaned file `{path}`: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::notice::Severity;
    use crate::models::resource::ResourceType;
    use crate::storage::path::{BucketSegmentResolver, StoragePathResolver};
    use crate::tests::support::{MemoryBlobStore, MemoryResourceStore, BUCKET};

    fn request(file: Option<UploadFile>) -> UploadResource {
        UploadResource {
            name: "Quantum Notes".to_string(),
            resource_type: ResourceType::LectureNotes,
            course: "PHY301".to_string(),
            year: 2023,
            description: "Fundamentals".to_string(),
            keywords: vec!["quantum".to_string()],
            file,
        }
    }

    fn pdf() -> UploadFile {
        UploadFile {
            file_name: "intro notes.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_without_file_inserts_row() {
        let store = MemoryResourceStore::default();
        let blobs = MemoryBlobStore::default();

        let report = Uploader::new(&store, &blobs)
            .upload(7, request(None))
            .await
            .unwrap();

        assert!(report.resource.file.is_none());
        assert_eq!(report.resource.uploader_id, Some(7));
        assert_eq!(report.notice.severity, Severity::Success);
        assert_eq!(report.notice.description, "\"Quantum Notes\" has been added.");
        assert_eq!(store.resources(), vec![report.resource]);
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn upload_with_file_stores_blob_under_resource_id() {
        let store = MemoryResourceStore::default();
        let blobs = MemoryBlobStore::default();

        let report = Uploader::new(&store, &blobs)
            .upload(7, request(Some(pdf())))
            .await
            .unwrap();

        let file = report.resource.file.clone().unwrap();
        assert_eq!(file.file_name, "intro notes.pdf");
        assert_eq!(file.file_size_bytes, Some(8));
        assert_eq!(file.file_mime_type.as_deref(), Some("application/pdf"));
        let path = BucketSegmentResolver::new(BUCKET)
            .resolve_storage_path(&file.file_url)
            .unwrap();
        assert_eq!(path, upload_path(&report.resource.id, "intro notes.pdf").unwrap());
        assert!(blobs.contains(&path));
        assert_eq!(store.resources().len(), 1);
    }

    #[tokio::test]
    async fn failed_file_upload_aborts_before_insert() {
        let store = MemoryResourceStore::default();
        let blobs = MemoryBlobStore::default();
        blobs.fail_uploads_with("quota exceeded");

        let err = Uploader::new(&store, &blobs)
            .upload(7, request(Some(pdf())))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RequestError::RemoteWrite { title: "File Upload Failed", ref message } if message.contains("quota exceeded")
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_insert_discards_uploaded_file() {
        let store = MemoryResourceStore::default();
        store.fail_inserts_with("duplicate key value");
        let blobs = MemoryBlobStore::default();

        let err = Uploader::new(&store, &blobs)
            .upload(7, request(Some(pdf())))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RequestError::RemoteWrite { title: "Resource Creation Failed", ref message } if message.contains("duplicate key value")
        ));
        assert!(blobs.is_empty());
        assert_eq!(blobs.remove_calls().len(), 1);
    }
}
