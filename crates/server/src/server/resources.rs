use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::context::AuthContext;
use crate::catalog::deletion::{DeletionReport, Terminal};
use crate::catalog::filter::{CatalogView, FilterCriteria};
use crate::catalog::notice::Notice;
use crate::error::{RequestError, ValidationError};
use crate::models::resource::{Resource, ResourceId, UploadResource, UploadResourcePayload};
use crate::server::state::AppState;
use crate::storage::StoragePath;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub resource: Resource,
    pub notice: Notice,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub report: DeletionReport,
    pub terminal: Terminal,
    pub notice: Notice,
}

impl From<DeletionReport> for DeleteResponse {
    fn from(report: DeletionReport) -> Self {
        Self {
            terminal: report.terminal(),
            notice: report.notice(),
            report,
        }
    }
}

/// Partial success still means the resource is gone.
pub fn delete_status(report: &DeletionReport) -> StatusCode {
    if report.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// `?reset=true` drops every other filter parameter.
#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub reset: bool,
}

pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Query(mut criteria): Query<FilterCriteria>,
    Query(reset): Query<ResetQuery>,
) -> Result<Json<CatalogView>, RequestError> {
    if reset.reset {
        criteria.reset();
    }
    Ok(Json(state.catalog.list(&criteria).await?))
}

pub async fn upload_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Json(payload): Json<UploadResourcePayload>,
) -> Result<(StatusCode, Json<UploadResponse>), RequestError> {
    let request = UploadResource::try_from(payload)?;
    let report = state.catalog.upload(&auth.principal, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            resource: report.resource,
            notice: report.notice,
        }),
    ))
}

pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<ResourceId>,
) -> Result<(StatusCode, Json<DeleteResponse>), RequestError> {
    let report = state.catalog.delete(&auth.principal, id).await?;
    Ok((delete_status(&report), Json(DeleteResponse::from(report))))
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, RequestError> {
    let path = object_path(&state.config.storage.bucket, &bucket, &path)?;
    let bytes = state.catalog.read_file(&path).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// Objects are only served out of the configured bucket.
fn object_path(configured: &str, bucket: &str, path: &str) -> Result<StoragePath, RequestError> {
    if bucket != configured {
        return Err(ValidationError::NotFound.into());
    }
    Ok(StoragePath::new(path)?)
}
