//! Removes a resource's stored file and then its row, folding both results
//! into one report.
//!
//! The storage attempt always finishes before the row delete starts, and the
//! row delete is attempted whatever happened in storage: a leftover blob can be
//! cleaned up by hand, a leftover row stays visible in the catalog.

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::catalog::notice::Notice;
use crate::catalog::store::{store_error_message, ResourceStore, RowDeletion};
use crate::models::resource::{Resource, ResourceId};
use crate::storage::path::StoragePathResolver;
use crate::storage::BlobStore;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRef {
    pub url: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionTarget {
    pub id: ResourceId,
    pub name: String,
    pub file: Option<FileRef>,
}

impl DeletionTarget {
    /// Target for a row that could not be loaded, only the id is known.
    pub fn bare(id: ResourceId) -> Self {
        Self {
            id,
            name: id.to_string(),
            file: None,
        }
    }
}

impl From<&Resource> for DeletionTarget {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id,
            name: resource.name.clone(),
            file: resource.file.as_ref().map(|f| FileRef {
                url: f.file_url.clone(),
                name: f.file_name.clone(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StorageOutcome {
    NotApplicable,
    Deleted,
    AlreadyAbsent,
    PathUndetermined,
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Deleted,
    AlreadyAbsent,
    Failed { message: String },
}

impl From<RowDeletion> for RowOutcome {
    fn from(deletion: RowDeletion) -> Self {
        match deletion {
            RowDeletion::Deleted => Self::Deleted,
            RowDeletion::AlreadyAbsent => Self::AlreadyAbsent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    FullSuccess,
    PartialSuccess,
    HardFailure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub storage: StorageOutcome,
    pub row: RowOutcome,
}

impl DeletionReport {
    pub fn terminal(&self) -> Terminal {
        match (&self.row, &self.storage) {
            (RowOutcome::Failed { .. }, _) => Terminal::HardFailure,
            (_, StorageOutcome::Deleted | StorageOutcome::NotApplicable) => Terminal::FullSuccess,
            _ => Terminal::PartialSuccess,
        }
    }

    /// Whether the caller may treat the resource as gone.
    pub fn is_success(&self) -> bool {
        self.terminal() != Terminal::HardFailure
    }

    pub fn notice(&self) -> Notice {
        let name = &self.resource_name;
        if let RowOutcome::Failed { message } = &self.row {
            return Notice::error(
                "Deletion Failed",
                format!("Could not delete resource: {message}"),
            );
        }
        let row_note = match self.row {
            RowOutcome::AlreadyAbsent => " The record had already been removed.",
            _ => "",
        };
        match &self.storage {
            StorageOutcome::NotApplicable | StorageOutcome::Deleted => Notice::success(
                "Resource Deleted",
                format!("\"{name}\" has been removed.{row_note}"),
            ),
            StorageOutcome::AlreadyAbsent => Notice::success(
                "Resource Deleted",
                format!(
                    "\"{name}\" has been removed. Its file was already gone from storage.{row_note}"
                ),
            ),
            StorageOutcome::PathUndetermined => Notice::success(
                "Resource Deleted",
                format!(
                    "\"{name}\" has been removed, but the storage location of its file could not \
                     be determined. The file may need to be cleaned up manually.{row_note}"
                ),
            ),
            StorageOutcome::Failed { message } => Notice::warning(
                "Resource Deleted With Warnings",
                format!(
                    "\"{name}\" has been removed, but its file may still exist in storage: \
                     {message}{row_note}"
                ),
            ),
        }
    }
}

pub struct DeletionReconciler<'a> {
    store: &'a dyn ResourceStore,
    blobs: &'a dyn BlobStore,
    resolver: &'a dyn StoragePathResolver,
}

impl<'a> DeletionReconciler<'a> {
    pub fn new(
        store: &'a dyn ResourceStore,
        blobs: &'a dyn BlobStore,
        resolver: &'a dyn StoragePathResolver,
    ) -> Self {
        Self {
            store,
            blobs,
            resolver,
        }
    }

    #[instrument(skip_all, fields(resource_id = %target.id))]
    pub async fn reconcile(&self, target: &DeletionTarget) -> DeletionReport {
        let storage = self.remove_file(target).await;
        let row = match self.store.delete_resource(&target.id).await {
            Ok(deletion) => RowOutcome::from(deletion),
            Err(e) => {
                error!("failed to delete resource row: {e}");
                RowOutcome::Failed {
                    message: store_error_message(&e),
                }
            }
        };
        let report = DeletionReport {
            resource_id: target.id,
            resource_name: target.name.clone(),
            storage,
            row,
        };
        info!(terminal = ?report.terminal(), "resource deletion finished");
        report
    }

    async fn remove_file(&self, target: &DeletionTarget) -> StorageOutcome {
        let Some(file) = &target.file else {
            return StorageOutcome::NotApplicable;
        };
        let Some(path) = self.resolver.resolve_storage_path(&file.url) else {
            warn!("cannot determine storage path of `{}`, skipping file removal", file.url);
            return StorageOutcome::PathUndetermined;
        };
        match self.blobs.remove(&path).await {
            Ok(()) => StorageOutcome::Deleted,
            Err(e) if e.is_not_found() => {
                info!("file `{path}` was already absent from storage");
                StorageOutcome::AlreadyAbsent
            }
            Err(e) => {
                warn!("failed to remove file `{path}` from storage: {e}");
                StorageOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}
