use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::routing::{delete, get, post};
use axum::Router;
use tracing::info;

use crate::server::constants::{MAX_BODY_BYTES, MAX_UPLOAD_BODY_BYTES};
use crate::server::resources::{delete_resource, download_file, list_resources, upload_resource};
use crate::server::session::{login, logout, refresh, register, whoami};
use crate::server::state::AppState;

/// Uploads carry base64 file content, every other route gets a small body cap.
pub fn app(state: Arc<AppState>) -> Router {
    let upload = upload_resource.layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/whoami", get(whoami))
        .route("/resources", get(list_resources).post(upload))
        .route("/resources/:id", delete(delete_resource))
        .route("/files/:bucket/*path", get(download_file))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.server.address.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("starting server on: {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
