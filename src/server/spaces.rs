use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{
    ExistsResponse, ListParams, MemberRequest, SpaceExistsParams, SpaceListItem, SpaceRequest,
};
use crate::server::response::{ApiError, ApiResponse, ApiResult, ListResponse};
use crate::server::validation::{require_id, validate_description, validate_space_name};
use crate::space;
use crate::store::{Page, Store};
use crate::types::Space;

/// Fails unless `user_id` is a member of `space_id`.
pub(crate) fn ensure_member(store: &dyn Store, user_id: i64, space_id: i64) -> Result<(), ApiError> {
    let spaces = space::accessible_space_ids(store, user_id)?;
    if spaces.contains(&space_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("no access to this space"))
    }
}

pub async fn create_space(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_space_name(&req.name)?;
    validate_description(&req.description)?;

    let store = state.store.as_ref();
    let created = space::create_or_update(store, 0, &req.name, &req.description)?;
    space::add_member(store, created.id, user.user_id)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_space(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SpaceRequest>,
) -> ApiResult<Space> {
    let id = require_id(id)?;
    validate_space_name(&req.name)?;
    validate_description(&req.description)?;

    let store = state.store.as_ref();
    ensure_member(store, user.user_id, id)?;
    let updated = space::create_or_update(store, id, &req.name, &req.description)?;

    Ok(Json(ApiResponse::success(updated)))
}

pub async fn list_spaces(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<ListResponse<SpaceListItem>> {
    let store = state.store.as_ref();
    let space_ids = space::accessible_space_ids(store, user.user_id)?;
    let (spaces, total) = space::list(
        store,
        &params.keyword,
        &space_ids,
        Page::new(params.offset, params.limit),
    )?;

    let list = spaces
        .into_iter()
        .map(|s| {
            Ok(SpaceListItem {
                have_project: space::check_space_have_project(store, s.id)?,
                id: s.id,
                name: s.name,
                description: s.description,
                created_at: s.created_at,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(ApiResponse::success(ListResponse::new(list, total))))
}

pub async fn get_space(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Space> {
    let store = state.store.as_ref();
    let found = space::detail(store, id)?;
    ensure_member(store, user.user_id, found.id)?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn delete_space(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = require_id(id)?;
    let store = state.store.as_ref();
    ensure_member(store, user.user_id, id)?;
    space::delete(store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn space_exists(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SpaceExistsParams>,
) -> ApiResult<ExistsResponse> {
    if params.keyword.trim().is_empty() {
        return Err(ApiError::bad_request("params error"));
    }
    let exists = space::check_exists(state.store.as_ref(), params.id, params.keyword.trim())?;
    Ok(Json(ApiResponse::success(ExistsResponse { exists })))
}

pub async fn add_member(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<MemberRequest>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.as_ref();
    ensure_member(store, user.user_id, id)?;
    space::add_member(store, id, req.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, member_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.as_ref();
    ensure_member(store, user.user_id, id)?;
    space::remove_member(store, id, member_id)?;
    Ok(StatusCode::NO_CONTENT)
}
