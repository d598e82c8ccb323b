use std::sync::Arc;

use tracing::{info, instrument, Instrument};

use crate::auth::context::Principal;
use crate::catalog::deletion::{DeletionReconciler, DeletionReport, DeletionTarget};
use crate::catalog::filter::{CatalogView, FilterCriteria};
use crate::catalog::in_flight::InFlightDeletions;
use crate::catalog::store::ResourceStore;
use crate::catalog::upload::{UploadReport, Uploader};
use crate::error::RequestError;
use crate::models::resource::{ResourceId, UploadResource};
use crate::storage::path::StoragePathResolver;
use crate::storage::{BlobStore, StoragePath};

pub mod deletion;
pub mod filter;
pub mod in_flight;
pub mod notice;
pub mod store;
pub mod upload;

/// Resource listing, admin uploads and deletion on top of the external stores.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn ResourceStore>,
    blobs: Arc<dyn BlobStore>,
    resolver: Arc<dyn StoragePathResolver>,
    in_flight: InFlightDeletions,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        blobs: Arc<dyn BlobStore>,
        resolver: Arc<dyn StoragePathResolver>,
    ) -> Self {
        Self {
            store,
            blobs,
            resolver,
            in_flight: InFlightDeletions::default(),
        }
    }

    /// Loads the full collection and applies `criteria` to it. Facets always
    /// describe the full collection. Visible resources with a deletion still
    /// running are listed in `deleting`.
    #[instrument(skip(self))]
    pub async fn list(&self, criteria: &FilterCriteria) -> Result<CatalogView, RequestError> {
        let resources = self.store.list_resources().await?;
        let mut view = CatalogView::build(&resources, criteria);
        view.deleting = view
            .resources
            .iter()
            .map(|r| r.id)
            .filter(|id| self.in_flight.contains(id))
            .collect();
        Ok(view)
    }

    pub async fn upload(
        &self,
        principal: &Principal,
        request: UploadResource,
    ) -> Result<UploadReport, RequestError> {
        principal.require_admin()?;
        Uploader::new(self.store.as_ref(), self.blobs.as_ref())
            .upload(principal.user_id, request)
            .await
    }

    /// Runs the deletion flow for `id`. A second request for the same id is
    /// rejected while the first one is still running.
    ///
    /// The flow runs on its own task, so a dropped request never stops it
    /// between the storage and row calls.
    #[instrument(skip(self, principal), fields(user_id = principal.user_id))]
    pub async fn delete(
        &self,
        principal: &Principal,
        id: ResourceId,
    ) -> Result<DeletionReport, RequestError> {
        principal.require_admin()?;
        let guard = self
            .in_flight
            .try_acquire(id)
            .ok_or(RequestError::DeletionInProgress(id))?;
        let store = Arc::clone(&self.store);
        let blobs = Arc::clone(&self.blobs);
        let resolver = Arc::clone(&self.resolver);
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                let target = match store.get_resource(&id).await? {
                    Some(resource) => DeletionTarget::from(&resource),
                    None => {
                        info!("resource row is missing, deleting by id only");
                        DeletionTarget::bare(id)
                    }
                };
                let reconciler =
                    DeletionReconciler::new(store.as_ref(), blobs.as_ref(), resolver.as_ref());
                Ok::<_, RequestError>(reconciler.reconcile(&target).await)
            }
            .in_current_span(),
        );
        task.await?
    }

    pub async fn read_file(&self, path: &StoragePath) -> Result<Vec<u8>, RequestError> {
        Ok(self.blobs.read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::catalog::deletion::{RowOutcome, StorageOutcome, Terminal};
    use crate::models::resource::ResourceType;
    use crate::models::user::UserRole;
    use crate::storage::path::BucketSegmentResolver;
    use crate::tests::support::{sample_resource, MemoryBlobStore, MemoryResourceStore, BUCKET};

    fn admin() -> Principal {
        Principal {
            user_id: 1,
            alias: "origin".to_string(),
            role: UserRole::Admin,
        }
    }

    fn student() -> Principal {
        Principal {
            user_id: 2,
            alias: "student".to_string(),
            role: UserRole::Regular,
        }
    }

    fn catalog(store: Arc<MemoryResourceStore>, blobs: Arc<MemoryBlobStore>) -> Catalog {
        Catalog::new(store, blobs, Arc::new(BucketSegmentResolver::new(BUCKET)))
    }

    fn request() -> UploadResource {
        UploadResource {
            name: "Organic Chemistry Lab Manual".to_string(),
            resource_type: ResourceType::LabEquipment,
            course: "CHM210".to_string(),
            year: 2024,
            description: "Safety procedures".to_string(),
            keywords: vec![],
            file: None,
        }
    }

    #[tokio::test]
    async fn list_filters_but_keeps_full_facets() {
        let store = Arc::new(MemoryResourceStore::with_resources(vec![
            sample_resource("Calculus Notes", None),
            sample_resource("Quantum Notes", None),
        ]));
        let catalog = catalog(store, Arc::default());

        let view = catalog
            .list(&FilterCriteria {
                search: "quantum".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(view.resources.len(), 1);
        assert_eq!(view.resources[0].name, "Quantum Notes");
        assert_eq!(view.total, 2);
    }

    #[tokio::test]
    async fn regular_user_cannot_upload_or_delete() {
        let resource = sample_resource("Calculus Notes", None);
        let store = Arc::new(MemoryResourceStore::with_resources(vec![resource.clone()]));
        let catalog = catalog(store.clone(), Arc::default());

        let err = catalog.upload(&student(), request()).await.unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        let err = catalog.delete(&student(), resource.id).await.unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));

        assert_eq!(store.resources(), vec![resource]);
        assert!(store.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn admin_upload_becomes_visible_in_listing() {
        let store = Arc::new(MemoryResourceStore::default());
        let catalog = catalog(store, Arc::default());

        let report = catalog.upload(&admin(), request()).await.unwrap();
        let view = catalog.list(&FilterCriteria::default()).await.unwrap();

        assert_eq!(view.resources, vec![report.resource]);
        assert_eq!(view.facets.available_courses, ["CHM210"]);
    }

    #[tokio::test]
    async fn deletion_of_unknown_id_reports_absent_row() {
        let store = Arc::new(MemoryResourceStore::default());
        let catalog = catalog(store.clone(), Arc::default());
        let id = ResourceId::new_v4();

        let report = catalog.delete(&admin(), id).await.unwrap();

        assert_eq!(report.storage, StorageOutcome::NotApplicable);
        assert_eq!(report.row, RowOutcome::AlreadyAbsent);
        assert_eq!(report.terminal(), Terminal::FullSuccess);
        assert_eq!(store.delete_calls(), vec![id]);
        assert!(!catalog.in_flight.contains(&id));
    }

    #[tokio::test]
    async fn concurrent_deletion_of_same_id_is_rejected() {
        let resource = sample_resource("Calculus Notes", None);
        let store = Arc::new(MemoryResourceStore::with_resources(vec![resource.clone()]));
        let catalog = catalog(store.clone(), Arc::default());

        let guard = catalog.in_flight.try_acquire(resource.id).unwrap();
        let err = catalog.delete(&admin(), resource.id).await.unwrap_err();
        assert!(matches!(err, RequestError::DeletionInProgress(id) if id == resource.id));
        assert!(store.delete_calls().is_empty());

        drop(guard);
        let report = catalog.delete(&admin(), resource.id).await.unwrap();
        assert!(report.is_success());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn stored_file_is_served_until_deleted() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let path = StoragePath::new("public/1/syllabus.pdf").unwrap();
        let url = blobs.put(&path, b"syllabus");
        let resource = sample_resource("Syllabus", Some(url));
        let store = Arc::new(MemoryResourceStore::with_resources(vec![resource.clone()]));
        let catalog = catalog(store, blobs);

        assert_eq!(catalog.read_file(&path).await.unwrap(), b"syllabus");
        catalog.delete(&admin(), resource.id).await.unwrap();
        let err = catalog.read_file(&path).await.unwrap_err();
        assert!(matches!(err, RequestError::Storage(e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn dropped_request_does_not_cancel_deletion() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let path = StoragePath::new("public/1/notes.pdf").unwrap();
        let url = blobs.put(&path, b"pdf");
        let resource = sample_resource("Quantum Notes", Some(url));
        let store = Arc::new(MemoryResourceStore::with_resources(vec![resource.clone()]));
        store.delay_deletes_by(Duration::from_millis(200));
        let catalog = catalog(store.clone(), blobs.clone());

        let actor = admin();
        let request = catalog.delete(&actor, resource.id);
        let dropped = tokio::time::timeout(Duration::from_millis(50), request).await;
        assert!(dropped.is_err());
        assert!(catalog.in_flight.contains(&resource.id));
        let view = catalog.list(&FilterCriteria::default()).await.unwrap();
        assert_eq!(view.deleting, vec![resource.id]);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!blobs.contains(&path));
        assert!(store.is_empty());
        assert!(!catalog.in_flight.contains(&resource.id));
        let view = catalog.list(&FilterCriteria::default()).await.unwrap();
        assert!(view.deleting.is_empty());
    }
}
