use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::resource::ResourceId;
use crate::models::user::UserRole;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("bad auth or refresh credentials")]
    BadCredentials,
    #[error("too many attempts, try again later")]
    TooManyRequests,
    #[error("operation is not valid anymore, likely requires session refresh or re-login")]
    Expired,
    #[error("deletion of resource {0} is already in progress")]
    DeletionInProgress(ResourceId),
    #[error("{title}: {message}")]
    RemoteWrite { title: &'static str, message: String },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("limit exceeded for {subject}, allowed {limit} {unit}(s), got {attempted}")]
    LimitExceeded {
        subject: String,
        unit: String,
        attempted: usize,
        limit: usize,
    },
    #[error(
        "insufficient permissions for action, required role: {required}, current role: {current}"
    )]
    InsufficientPermissions {
        required: UserRole,
        current: UserRole,
    },
    #[error("requested object doesn't exist or the caller doesn't have access")]
    NotFound,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::Sqlx(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
                e => {
                    error!("received internal error for user request: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong".into(),
                    )
                }
            },
            Self::Storage(StorageError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not found".into())
            }
            Self::Storage(e @ StorageError::InvalidPath { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Storage(e) => {
                error!("received storage error for user request: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".into(),
                )
            }
            e @ (Self::Task(_) | Self::Internal(_)) => {
                error!("received internal error for user request: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".into(),
                )
            }
            Self::Validation(e @ ValidationError::InsufficientPermissions { .. }) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            Self::Validation(e @ ValidationError::NotFound) => (StatusCode::NOT_FOUND, e.to_string()),
            Self::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ Self::RemoteWrite { .. } => (StatusCode::BAD_GATEWAY, e.to_string()),
            e @ Self::BadCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
            e @ Self::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, e.to_string()),
            e @ Self::DeletionInProgress(_) => (StatusCode::CONFLICT, e.to_string()),
            e @ Self::Expired => (StatusCode::UNAUTHORIZED, e.to_string()),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}

#[derive(Clone, Debug)]
pub enum SessionError {
    BadToken,
    TokenNotFound,
    TokenExpired,
    Internal,
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::TokenNotFound,
            e => {
                error!("failed to resolve session: {e}");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadToken => (StatusCode::BAD_REQUEST, "Missing or bad token in request"),
            Self::TokenNotFound => (StatusCode::UNAUTHORIZED, "Token cannot be found"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };
        let error = json!({ "error": error }).to_string();
        (status, error).into_response()
    }
}
