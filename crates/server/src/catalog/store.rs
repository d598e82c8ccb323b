use async_trait::async_trait;
use sqlx::Error as SqlxError;

use crate::models::resource::{Resource, ResourceId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowDeletion {
    Deleted,
    AlreadyAbsent,
}

/// Document store holding the resource rows.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn list_resources(&self) -> Result<Vec<Resource>, SqlxError>;

    async fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>, SqlxError>;

    async fn insert_resource(&self, resource: &Resource) -> Result<(), SqlxError>;

    /// Deletes the row with exactly this id. Deleting a missing row is not an
    /// error and reports [`RowDeletion::AlreadyAbsent`].
    async fn delete_resource(&self, id: &ResourceId) -> Result<RowDeletion, SqlxError>;
}

/// Message to show for a failed store call. Statements rejected by the
/// database keep the server's own message.
pub fn store_error_message(e: &SqlxError) -> String {
    match e.as_database_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    }
}
