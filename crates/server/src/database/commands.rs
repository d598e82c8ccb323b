use sqlx::{Error as SqlxError, PgExecutor, Row};
use tracing::{info, instrument};

use crate::catalog::store::RowDeletion;
use crate::models::resource::{Resource, ResourceId};
use crate::models::session::{CreateSessionRequest, SessionId, UpdateTokensRequest};
use crate::models::user::{CreateUserRequest, UserId};

#[instrument(skip_all, fields(alias = %user.alias))]
pub async fn create_user<'a, E: PgExecutor<'a>>(
    executor: E,
    user: &CreateUserRequest,
) -> Result<UserId, SqlxError> {
    let result = sqlx::query(
        "
            INSERT INTO users (alias, display_name, password_hash, role)
            VALUES ($1, $2, $3, $4) RETURNING id;
        ",
    )
    .bind(&user.alias)
    .bind(&user.display_name)
    .bind(&user.password_hash)
    .bind(user.role)
    .fetch_one(executor)
    .await?
    .try_get("id")?;
    info!("created user with id: {}", result);
    Ok(result)
}

#[instrument(skip_all, fields(resource_id = %resource.id))]
pub async fn insert_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    resource: &Resource,
) -> Result<(), SqlxError> {
    let file = resource.file.as_ref();
    sqlx::query(
        "
            INSERT INTO resources (
                id, name, type, course, year, description, keywords,
                file_url, file_name, file_mime_type, file_size_bytes, uploader_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12);
        ",
    )
    .bind(resource.id)
    .bind(&resource.name)
    .bind(resource.resource_type)
    .bind(&resource.course)
    .bind(resource.year)
    .bind(&resource.description)
    .bind(&resource.keywords)
    .bind(file.map(|f| f.file_url.as_str()))
    .bind(file.map(|f| f.file_name.as_str()))
    .bind(file.and_then(|f| f.file_mime_type.as_deref()))
    .bind(file.and_then(|f| f.file_size_bytes))
    .bind(resource.uploader_id)
    .execute(executor)
    .await?;
    info!("inserted resource");
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_resource<'a, E: PgExecutor<'a>>(
    executor: E,
    id: &ResourceId,
) -> Result<RowDeletion, SqlxError> {
    let affected = sqlx::query("DELETE FROM resources WHERE id = $1;")
        .bind(id)
        .execute(executor)
        .await?
        .rows_affected();
    if affected == 0 {
        info!("resource row was already absent");
        Ok(RowDeletion::AlreadyAbsent)
    } else {
        info!("deleted resource row");
        Ok(RowDeletion::Deleted)
    }
}

#[instrument(skip_all, fields(user_id = request.user_id))]
pub async fn create_session<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &CreateSessionRequest,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            INSERT INTO sessions (
                id, user_id, refresh_token_hash, refresh_token_expires_at,
                access_token_hash, access_token_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6);
        ",
    )
    .bind(request.session_id)
    .bind(request.user_id)
    .bind(&request.refresh_token_hash[..])
    .bind(request.refresh_token_expires_at)
    .bind(&request.access_token_hash[..])
    .bind(request.access_token_expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[instrument(skip_all, fields(session_id = %request.session_id))]
pub async fn update_session_tokens<'a, E: PgExecutor<'a>>(
    executor: E,
    request: &UpdateTokensRequest,
) -> Result<(), SqlxError> {
    let affected = sqlx::query(
        "
            UPDATE sessions SET
                refresh_token_hash = $2, refresh_token_expires_at = $3,
                access_token_hash = $4, access_token_expires_at = $5
            WHERE id = $1 AND refresh_token_hash = $6;
        ",
    )
    .bind(request.session_id)
    .bind(&request.refresh_token_hash[..])
    .bind(request.refresh_token_expires_at)
    .bind(&request.access_token_hash[..])
    .bind(request.access_token_expires_at)
    .bind(&request.previous_refresh_token_hash)
    .execute(executor)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(SqlxError::RowNotFound);
    }
    Ok(())
}

#[instrument(skip(executor))]
pub async fn delete_session<'a, E: PgExecutor<'a>>(
    executor: E,
    session_id: &SessionId,
) -> Result<(), SqlxError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1;")
        .bind(session_id)
        .execute(executor)
        .await?;
    Ok(())
}
