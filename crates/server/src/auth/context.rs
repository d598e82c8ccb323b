use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use tracing::debug;

use crate::auth::token::decode_token;
use crate::error::{SessionError, ValidationError};
use crate::models::session::SessionId;
use crate::models::user::{UserId, UserRole};
use crate::server::state::AppState;

/// Authenticated identity. The catalog only ever asks whether it is an admin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub alias: String,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), ValidationError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ValidationError::InsufficientPermissions {
                required: UserRole::Admin,
                current: self.role,
            })
        }
    }
}

/// Per-request authentication context, resolved from the bearer access token
/// of a live session. Sessions start at login, rotate on refresh and end at
/// logout.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub session_id: SessionId,
    pub principal: Principal,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("malformed auth header token: {e}");
                SessionError::BadToken
            })?;
        let (session_id, access_token) = decode_token(bearer.token()).ok_or_else(|| {
            debug!("malformed auth header token: unable to decode");
            SessionError::BadToken
        })?;
        let principal = state
            .db_connection
            .resolve_principal(&session_id, &access_token)
            .await?;
        Ok(AuthContext {
            session_id,
            principal,
        })
    }
}
