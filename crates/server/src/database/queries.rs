use sqlx::{Error as SqlxError, PgExecutor};
use tracing::instrument;

use crate::models::resource::{Resource, ResourceId, ResourceRow};
use crate::models::session::{RefreshSessionResponse, ResolveSessionResponse, SessionId};
use crate::models::user::GetUserCredentialsByAliasResponse;

const RESOURCE_COLUMNS: &str = "
    id, name, type, course, year, description, keywords,
    file_url, file_name, file_mime_type, file_size_bytes, uploader_id
";

#[instrument(skip(executor))]
pub async fn list_resources<'a, E: PgExecutor<'a>>(executor: E) -> Result<Vec<Resource>, SqlxError> {
    let rows: Vec<ResourceRow> = sqlx::query_as(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY created_at, id;"
    ))
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(Resource::from).collect())
}

#[instrument(skip(executor))]
pub async fn get_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    id: &ResourceId,
) -> Result<Option<Resource>, SqlxError> {
    let row: Option<ResourceRow> = sqlx::query_as(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1;"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(Resource::from))
}

#[instrument(skip(executor))]
pub async fn get_user_credentials_by_alias<'a, E: PgExecutor<'a>>(
    executor: E,
    alias: &str,
) -> Result<GetUserCredentialsByAliasResponse, SqlxError> {
    sqlx::query_as("SELECT id AS user_id, password_hash FROM users WHERE alias = $1;")
        .bind(alias)
        .fetch_one(executor)
        .await
}

#[instrument(skip(executor))]
pub async fn resolve_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<ResolveSessionResponse, SqlxError> {
    sqlx::query_as(
        "
    SELECT
        users.id AS user_id, users.alias AS alias, users.role AS role,
        sessions.access_token_hash AS access_token_hash,
        sessions.access_token_expires_at AS access_token_expires_at
    FROM
        sessions JOIN users ON sessions.user_id = users.id
    WHERE
        sessions.id = $1;
    ",
    )
    .bind(session_id)
    .fetch_one(executor)
    .await
}

#[instrument(skip(executor))]
pub async fn get_refresh_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<RefreshSessionResponse, SqlxError> {
    sqlx::query_as(
        "
    SELECT user_id, refresh_token_hash, refresh_token_expires_at
    FROM sessions
    WHERE id = $1;
    ",
    )
    .bind(session_id)
    .fetch_one(executor)
    .await
}
