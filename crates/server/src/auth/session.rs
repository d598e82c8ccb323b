use chrono::{Duration, Utc};
use sqlx::Error as SqlxError;
use tracing::{info, instrument};

use crate::auth::context::Principal;
use crate::auth::token::{decode_token, token_matches, IssuedTokens, TokenExchangePayload};
use crate::auth::utils::{hash_password, verify_password};
use crate::database::commands::{
    create_session, create_user, delete_session, update_session_tokens,
};
use crate::database::connection::DbConnection;
use crate::database::queries::{get_refresh_session, get_user_credentials_by_alias, resolve_session};
use crate::database::utils::map_not_found_as_none;
use crate::error::{RequestError, SessionError, ValidationError};
use crate::models::session::{CreateSessionRequest, SessionId, UpdateTokensRequest};
use crate::models::user::{
    validate_user_alias, validate_user_password, CreateUserRequest, RegisterUserRequest, UserId,
    UserRole,
};
use crate::server::constants::{ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS};

fn issue_tokens() -> IssuedTokens {
    IssuedTokens::issue(
        Utc::now(),
        Duration::days(REFRESH_TOKEN_TTL_DAYS),
        Duration::minutes(ACCESS_TOKEN_TTL_MINUTES),
    )
}

/// Validates a sign up and hashes its password.
pub fn new_regular_user(request: &RegisterUserRequest) -> Result<CreateUserRequest, RequestError> {
    validate_user_password(&request.password)?;
    let password_hash =
        hash_password(&request.password).map_err(|e| RequestError::Internal(e.to_string()))?;
    let user = CreateUserRequest {
        alias: request.alias.clone(),
        display_name: request.display_name.clone(),
        role: UserRole::Regular,
        password_hash,
    };
    user.validate()?;
    Ok(user)
}

impl DbConnection {
    #[instrument(skip_all, fields(alias = %request.alias))]
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<UserId, RequestError> {
        let user = new_regular_user(request)?;
        match create_user(self.pool(), &user).await {
            Ok(user_id) => Ok(user_id),
            Err(SqlxError::Database(e)) if e.is_unique_violation() => {
                Err(ValidationError::InvalidInput {
                    value: request.alias.clone(),
                    reason: "alias is already taken".to_string(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        alias: &str,
        password: &str,
    ) -> Result<TokenExchangePayload, RequestError> {
        validate_user_alias(alias).map_err(|_| RequestError::BadCredentials)?;
        let credentials =
            map_not_found_as_none(get_user_credentials_by_alias(self.pool(), alias).await)?
                .ok_or(RequestError::BadCredentials)?;
        if !verify_password(password, &credentials.password_hash) {
            return Err(RequestError::BadCredentials);
        }
        let session_id = SessionId::new_v4();
        let tokens = issue_tokens();
        create_session(
            self.pool(),
            &CreateSessionRequest {
                session_id,
                user_id: credentials.user_id,
                refresh_token_hash: tokens.refresh_token_hash(),
                refresh_token_expires_at: tokens.refresh_token_expires_at,
                access_token_hash: tokens.access_token_hash(),
                access_token_expires_at: tokens.access_token_expires_at,
            },
        )
        .await?;
        info!("user {} started session {}", credentials.user_id, session_id);
        Ok(tokens.into_payload(&session_id))
    }

    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<TokenExchangePayload, RequestError> {
        let (session_id, token) = decode_token(refresh_token).ok_or(RequestError::BadCredentials)?;
        let session = map_not_found_as_none(get_refresh_session(self.pool(), &session_id).await)?
            .ok_or(RequestError::BadCredentials)?;
        if !token_matches(&token, &session.refresh_token_hash) {
            return Err(RequestError::BadCredentials);
        }
        if session.refresh_token_expires_at <= Utc::now() {
            return Err(RequestError::Expired);
        }
        let tokens = issue_tokens();
        let rotated = update_session_tokens(
            self.pool(),
            &UpdateTokensRequest {
                session_id,
                previous_refresh_token_hash: session.refresh_token_hash,
                refresh_token_hash: tokens.refresh_token_hash(),
                refresh_token_expires_at: tokens.refresh_token_expires_at,
                access_token_hash: tokens.access_token_hash(),
                access_token_expires_at: tokens.access_token_expires_at,
            },
        )
        .await;
        match rotated {
            Ok(()) => {}
            // Another refresh with the same token rotated it first.
            Err(SqlxError::RowNotFound) => return Err(RequestError::BadCredentials),
            Err(e) => return Err(e.into()),
        }
        info!("user {} refreshed session {}", session.user_id, session_id);
        Ok(tokens.into_payload(&session_id))
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: &SessionId) -> Result<(), RequestError> {
        delete_session(self.pool(), session_id).await?;
        info!("session {} ended", session_id);
        Ok(())
    }

    pub async fn resolve_principal(
        &self,
        session_id: &SessionId,
        access_token: &[u8],
    ) -> Result<Principal, SessionError> {
        let session = resolve_session(self.pool(), session_id).await?;
        if !token_matches(access_token, &session.access_token_hash) {
            return Err(SessionError::TokenNotFound);
        }
        if session.access_token_expires_at <= Utc::now() {
            return Err(SessionError::TokenExpired);
        }
        Ok(Principal {
            user_id: session.user_id,
            alias: session.alias,
            role: session.role,
        })
    }
}
