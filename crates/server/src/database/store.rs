use async_trait::async_trait;
use sqlx::Error as SqlxError;

use crate::catalog::store::{ResourceStore, RowDeletion};
use crate::database::commands::{delete_resource, insert_resource};
use crate::database::connection::DbConnection;
use crate::database::queries::{get_resource, list_resources};
use crate::models::resource::{Resource, ResourceId};

#[async_trait]
impl ResourceStore for DbConnection {
    async fn list_resources(&self) -> Result<Vec<Resource>, SqlxError> {
        list_resources(self.pool()).await
    }

    async fn get_resource(&self, id: &ResourceId) -> Result<Option<Resource>, SqlxError> {
        get_resource(self.pool(), id).await
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<(), SqlxError> {
        insert_resource(self.pool(), resource).await
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<RowDeletion, SqlxError> {
        delete_resource(self.pool(), id).await
    }
}
