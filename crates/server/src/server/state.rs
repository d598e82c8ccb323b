use std::sync::Arc;

use anyhow::Context;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::database::connection::DbConnection;
use crate::server::constants::LOGIN_ATTEMPTS_PER_MINUTE;
use crate::server::login_limit::LoginLimiter;
use crate::storage::filesystem::FilesystemBlobStore;
use crate::storage::path::BucketSegmentResolver;

pub struct AppState {
    pub config: AppConfig,
    pub db_connection: Arc<DbConnection>,
    pub catalog: Catalog,
    pub login_limiter: LoginLimiter,
}

impl AppState {
    pub async fn try_init(config: &AppConfig) -> anyhow::Result<Self> {
        let db_connection = Arc::new(DbConnection::connect(&config.database).await?);
        let blobs = FilesystemBlobStore::from_config(&config.storage)
            .context("failed to set up file storage")?;
        let catalog = Catalog::new(
            db_connection.clone(),
            Arc::new(blobs),
            Arc::new(BucketSegmentResolver::new(config.storage.bucket.clone())),
        );
        Ok(Self {
            config: config.clone(),
            db_connection,
            catalog,
            login_limiter: LoginLimiter::per_minute(LOGIN_ATTEMPTS_PER_MINUTE),
        })
    }
}
