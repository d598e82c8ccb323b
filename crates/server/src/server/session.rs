use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::context::AuthContext;
use crate::auth::token::{AuthPayload, RefreshPayload, TokenExchangePayload};
use crate::error::RequestError;
use crate::models::user::{RegisterUserRequest, UserRole, WhoAmIResponse};
use crate::server::state::AppState;

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AuthPayload>,
) -> Result<Json<TokenExchangePayload>, RequestError> {
    state.login_limiter.check(&payload.alias)?;
    let payload = state
        .db_connection
        .login(&payload.alias, &payload.password)
        .await?;
    Ok(Json(payload))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<WhoAmIResponse>), RequestError> {
    let user_id = state.db_connection.register(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(WhoAmIResponse {
            user_id,
            alias: payload.alias,
            role: UserRole::Regular,
            is_admin: false,
        }),
    ))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<TokenExchangePayload>, RequestError> {
    let payload = state
        .db_connection
        .refresh_session(&payload.refresh_token)
        .await?;
    Ok(Json(payload))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<StatusCode, RequestError> {
    state.db_connection.logout(&auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn whoami(auth: AuthContext) -> Json<WhoAmIResponse> {
    let principal = auth.principal;
    Json(WhoAmIResponse {
        user_id: principal.user_id,
        is_admin: principal.is_admin(),
        alias: principal.alias,
        role: principal.role,
    })
}
