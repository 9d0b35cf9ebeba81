use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateProjectRequest, ProjectListParams, UpdateProjectRequest};
use crate::server::response::{ApiError, ApiResponse, ApiResult, ListResponse};
use crate::server::spaces::ensure_member;
use crate::server::validation::{require_id, validate_description, validate_project_name};
use crate::space::{self, project};
use crate::store::Page;
use crate::types::{Project, ProjectUpdate};

pub async fn create_project(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_project_name(&req.name)?;
    validate_description(&req.description)?;
    let space_id = require_id(req.space_id)?;

    let store = state.store.as_ref();
    ensure_member(store, user.user_id, space_id)?;
    let created = project::create(
        store,
        project::NewProject {
            space_id,
            name: req.name,
            description: req.description,
        },
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn list_projects(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectListParams>,
) -> ApiResult<ListResponse<Project>> {
    let store = state.store.as_ref();
    let space_ids = space::accessible_space_ids(store, user.user_id)?;
    let (list, total) = project::list(
        store,
        &params.keyword,
        params.space_id,
        &space_ids,
        Page::new(params.offset, params.limit),
    )?;
    Ok(Json(ApiResponse::success(ListResponse::new(list, total))))
}

pub async fn get_project(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Project> {
    let store = state.store.as_ref();
    let found = project::detail(store, id)?;
    ensure_member(store, user.user_id, found.space_id)?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_project(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Project> {
    if let Some(name) = &req.name {
        validate_project_name(name)?;
    }
    if let Some(description) = &req.description {
        validate_description(description)?;
    }

    let store = state.store.as_ref();
    let existing = project::detail(store, id)?;
    ensure_member(store, user.user_id, existing.space_id)?;

    let update = ProjectUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
    };
    let updated = project::update(store, id, &update)?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_project(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.as_ref();
    let existing = project::detail(store, id)?;
    ensure_member(store, user.user_id, existing.space_id)?;
    project::delete(store, id)?;
    Ok(StatusCode::NO_CONTENT)
}
