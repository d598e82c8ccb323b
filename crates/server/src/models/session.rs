use chrono::{DateTime, Utc};

use crate::auth::token::SessionTokenHash;
use crate::models::user::{UserId, UserRole};

pub type SessionId = sqlx::types::Uuid;

#[derive(Clone, Debug)]
pub struct CreateSessionRequest {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub refresh_token_hash: SessionTokenHash,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token_hash: SessionTokenHash,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct UpdateTokensRequest {
    pub session_id: SessionId,
    /// Rotation only applies while this is still the stored refresh hash.
    pub previous_refresh_token_hash: Vec<u8>,
    pub refresh_token_hash: SessionTokenHash,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token_hash: SessionTokenHash,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ResolveSessionResponse {
    pub user_id: UserId,
    pub alias: String,
    pub role: UserRole,
    pub access_token_hash: Vec<u8>,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct RefreshSessionResponse {
    pub user_id: UserId,
    pub refresh_token_hash: Vec<u8>,
    pub refresh_token_expires_at: DateTime<Utc>,
}
