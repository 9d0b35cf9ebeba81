use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::auth::{RequireUser, session};
use crate::server::AppState;
use crate::server::dto::{IssuedTokenResponse, SessionResponse};
use crate::server::response::{ApiError, ApiResponse, ApiResult};

pub async fn me(user: RequireUser) -> ApiResult<SessionResponse> {
    Ok(Json(ApiResponse::success(SessionResponse {
        user_id: user.user_id,
        expire_time: user.token.expire_time,
    })))
}

/// Revokes every token held by the caller.
pub async fn logout(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    session::delete_by_user_id(state.store.as_ref(), user.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replaces the caller's token with a fresh one using the configured lifetime.
pub async fn refresh(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<IssuedTokenResponse> {
    let ttl = state.config.token_ttl()?;
    let issued = session::issue(state.store.as_ref(), user.user_id, ttl)?;
    Ok(Json(ApiResponse::success(IssuedTokenResponse {
        token: issued.token,
        expire_time: issued.expire_time,
    })))
}
