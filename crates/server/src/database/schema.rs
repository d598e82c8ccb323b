use sqlx::{Error as SqlxError, Postgres, Transaction};
use strum::IntoEnumIterator;
use tracing::{info, instrument};

use crate::auth::utils::hash_password;
use crate::database::commands::create_user;
use crate::database::connection::DbConnection;
use crate::models::resource::ResourceType;
use crate::models::user::{CreateUserRequest, UserRole};

pub const ORIGIN_USER_ALIAS: &str = "origin";

fn origin_user(password: &str) -> Result<CreateUserRequest, SqlxError> {
    let password_hash = hash_password(password).map_err(|e| SqlxError::Encode(e.to_string().into()))?;
    let user = CreateUserRequest {
        alias: ORIGIN_USER_ALIAS.to_string(),
        display_name: "Origin Admin".to_string(),
        role: UserRole::Admin,
        password_hash,
    };
    user.validate().map_err(|e| SqlxError::Encode(e.into()))?;
    Ok(user)
}

fn resource_type_enum_sql() -> String {
    let variants = ResourceType::iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TYPE resource_type AS ENUM ({variants});")
}

impl DbConnection {
    pub async fn create_all(&self, origin_password: &str) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_types(&mut transaction).await?;
        create_all_tables(&mut transaction).await?;
        create_origin_user(&mut transaction, origin_password).await?;
        transaction.commit().await?;
        info!("schema created");
        Ok(())
    }

    pub async fn drop_all(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        drop_all_types(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_types(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query("CREATE TYPE user_role AS ENUM ('admin', 'regular');")
        .execute(transaction.as_mut())
        .await?;
    sqlx::query(&resource_type_enum_sql())
        .execute(transaction.as_mut())
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_types(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TYPE IF EXISTS resource_type;",
        "DROP TYPE IF EXISTS user_role;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_all_tables(
    transaction: &mut Transaction<'_, Postgres>,
) -> Result<(), SqlxError> {
    sqlx::query(
        "
            CREATE TABLE users (
                id              int PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
                alias           VARCHAR(30) NOT NULL UNIQUE,
                display_name    VARCHAR(30) NOT NULL,
                password_hash   TEXT NOT NULL,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
                role            user_role NOT NULL
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE sessions (
                id                          uuid PRIMARY KEY,
                user_id                     int NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                refresh_token_hash          BYTEA NOT NULL,
                refresh_token_expires_at    TIMESTAMPTZ NOT NULL,
                access_token_hash           BYTEA NOT NULL,
                access_token_expires_at     TIMESTAMPTZ NOT NULL,
                created_at                  TIMESTAMPTZ NOT NULL DEFAULT current_timestamp
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE resources (
                id                  uuid PRIMARY KEY,
                name                VARCHAR(255) NOT NULL,
                type                resource_type NOT NULL,
                course              VARCHAR(50) NOT NULL,
                year                int NOT NULL,
                description         TEXT NOT NULL,
                keywords            TEXT[] NOT NULL DEFAULT '{}',
                file_url            TEXT,
                file_name           TEXT,
                file_mime_type      TEXT,
                file_size_bytes     bigint,
                uploader_id         int REFERENCES users(id) ON DELETE SET NULL,
                created_at          TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
                CONSTRAINT resources_file_attachment_complete CHECK (
                    (file_url IS NULL) = (file_name IS NULL)
                    AND (file_url IS NOT NULL OR (file_mime_type IS NULL AND file_size_bytes IS NULL))
                )
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Postgres>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS resources;",
        "DROP TABLE IF EXISTS sessions;",
        "DROP TABLE IF EXISTS users;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn create_origin_user(
    transaction: &mut Transaction<'_, Postgres>,
    password: &str,
) -> Result<(), SqlxError> {
    create_user(transaction.as_mut(), &origin_user(password)?)
        .await
        .map(|_| ())
}
