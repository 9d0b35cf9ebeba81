use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::DateTime;

use crate::auth::RequireUser;
use crate::deploy::{ApplyEdit, ApplyFilter, NewApply, apply};
use crate::mail::MailMessage;
use crate::server::AppState;
use crate::server::dto::{
    ApplyListParams, AuditRequest, CreateApplyRequest, StatusReportRequest, UpdateApplyRequest,
};
use crate::server::response::{ApiError, ApiResponse, ApiResult, ListResponse};
use crate::server::spaces::ensure_member;
use crate::server::validation::{require_id, validate_apply_name, validate_description};
use crate::space::{self, project};
use crate::store::{Page, Store};
use crate::types::{Apply, ApplyStatus, ApplySummary};

/// Loads an apply the caller is allowed to see.
fn visible_apply(store: &dyn Store, user_id: i64, id: i64) -> Result<Apply, ApiError> {
    let id = require_id(id)?;
    let found = apply::detail(store, id)?;
    ensure_member(store, user_id, found.space_id)?;
    Ok(found)
}

fn notify_audit(state: &AppState, found: &Apply, status: ApplyStatus, reason: &str) {
    let Some(mailer) = &state.mailer else {
        return;
    };
    let recipients = mailer.config().notify.clone();
    if recipients.is_empty() {
        return;
    }

    let mut body = format!(
        "<p>Apply <b>{}</b> (#{}) is now {status}.</p>",
        found.name, found.id
    );
    if !reason.is_empty() {
        body.push_str(&format!("<p>Reason: {reason}</p>"));
    }
    let msg = MailMessage {
        to: recipients,
        subject: format!("[shipway] apply {} {status}", found.name),
        body_html: body,
        ..Default::default()
    };
    // The status change is already committed; a delivery failure is only logged.
    if let Err(e) = mailer.send(msg) {
        tracing::warn!(apply_id = found.id, "audit notice not sent: {e}");
    }
}

pub async fn create_apply(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_apply_name(&req.name)?;
    validate_description(&req.description)?;
    let project_id = require_id(req.project_id)?;

    let store = state.store.as_ref();
    let owner = project::detail(store, project_id)?;
    ensure_member(store, user.user_id, owner.space_id)?;

    let created = apply::create(
        store,
        NewApply {
            project_id,
            space_id: owner.space_id,
            name: req.name.trim().to_string(),
            description: req.description,
            repo_data: req.repo_data,
            user_id: user.user_id,
        },
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn list_applies(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApplyListParams>,
) -> ApiResult<ListResponse<ApplySummary>> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            ApplyStatus::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("unknown apply status: {raw}")))?,
        ),
    };
    let created_after = match params.ctime {
        secs if secs <= 0 => None,
        secs => Some(
            DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| ApiError::bad_request("ctime out of range"))?,
        ),
    };

    let filter = ApplyFilter {
        keyword: params.keyword,
        user_id: if params.mine { user.user_id } else { 0 },
        project_id: params.project_id,
        created_after,
        status,
    };

    let store = state.store.as_ref();
    let space_ids = space::accessible_space_ids(store, user.user_id)?;
    let (list, total) = apply::list(
        store,
        &filter,
        &space_ids,
        Page::new(params.offset, params.limit),
    )?;

    Ok(Json(ApiResponse::success(ListResponse::new(list, total))))
}

pub async fn get_apply(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Apply> {
    let found = visible_apply(state.store.as_ref(), user.user_id, id)?;
    Ok(Json(ApiResponse::success(found)))
}

/// Only the submitter may edit, and only before the audit decision.
pub async fn update_apply(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateApplyRequest>,
) -> ApiResult<Apply> {
    validate_apply_name(&req.name)?;
    validate_description(&req.description)?;

    let store = state.store.as_ref();
    let found = visible_apply(store, user.user_id, id)?;
    if found.user_id != user.user_id {
        return Err(ApiError::forbidden("only the submitter can edit this apply"));
    }
    if found.status != ApplyStatus::AuditPending {
        return Err(ApiError::conflict(format!(
            "apply can not be edited in status {}",
            found.status
        )));
    }

    apply::update(
        store,
        found.id,
        ApplyEdit {
            name: req.name.trim().to_string(),
            description: req.description,
            repo_data: req.repo_data,
            status: found.status,
        },
    )?;

    Ok(Json(ApiResponse::success(apply::detail(store, found.id)?)))
}

/// Any member of the apply's space except its submitter may audit it.
pub async fn audit_apply(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<Apply> {
    let store = state.store.as_ref();
    let found = visible_apply(store, user.user_id, id)?;
    if found.user_id == user.user_id {
        return Err(ApiError::forbidden("submitter can not audit own apply"));
    }

    let next = if req.pass {
        ApplyStatus::AuditPass
    } else {
        ApplyStatus::AuditFailed
    };
    apply::transition(store, found.id, next, &req.reason)?;
    tracing::info!(apply_id = found.id, auditor = user.user_id, status = %next, "apply audited");

    notify_audit(&state, &found, next, &req.reason);

    Ok(Json(ApiResponse::success(apply::detail(store, found.id)?)))
}

pub async fn drop_apply(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Apply> {
    let store = state.store.as_ref();
    let found = visible_apply(store, user.user_id, id)?;
    apply::transition(store, found.id, ApplyStatus::Drop, "")?;
    Ok(Json(ApiResponse::success(apply::detail(store, found.id)?)))
}

/// Progress reports from the deploy executor.
///
/// The executor authenticates as an ordinary space member; there is no
/// separate executor role. Only deploy states are accepted and each move is
/// checked against the lifecycle, so a report can never skip the audit.
pub async fn report_status(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<StatusReportRequest>,
) -> ApiResult<Apply> {
    if !matches!(
        req.status,
        ApplyStatus::DeployIng | ApplyStatus::DeploySuccess | ApplyStatus::DeployFailed
    ) {
        return Err(ApiError::bad_request(format!(
            "status {} can not be reported",
            req.status
        )));
    }

    let store = state.store.as_ref();
    let found = visible_apply(store, user.user_id, id)?;
    apply::transition(store, found.id, req.status, &req.error_log)?;
    Ok(Json(ApiResponse::success(apply::detail(store, found.id)?)))
}
