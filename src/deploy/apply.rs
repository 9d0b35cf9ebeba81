//! Deploy apply records and their audit-and-release lifecycle.
//!
//! Every function takes the store explicitly. Gateway and encoding failures
//! surface as [`Error::Failed`] with a message naming the operation; the
//! underlying cause only reaches the log.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result, ResultExt};
use crate::store::{Field, Filter, Page, Store};
use crate::types::{
    Apply, ApplyRecord, ApplyRepoData, ApplyStatus, ApplySummary, ApplyUpdate, timestamp_now,
};

#[derive(Debug, Clone)]
pub struct NewApply {
    pub project_id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    pub repo_data: ApplyRepoData,
    pub user_id: i64,
}

/// Optional list criteria. Zero ids and `None` mean "not specified".
#[derive(Debug, Clone, Default)]
pub struct ApplyFilter {
    pub keyword: String,
    pub user_id: i64,
    pub project_id: i64,
    pub created_after: Option<DateTime<Utc>>,
    pub status: Option<ApplyStatus>,
}

/// Fields rewritten by a full edit.
#[derive(Debug, Clone)]
pub struct ApplyEdit {
    pub name: String,
    pub description: String,
    pub repo_data: ApplyRepoData,
    pub status: ApplyStatus,
}

fn encode_repo_data(repo_data: &ApplyRepoData) -> Result<String> {
    serde_json::to_string(repo_data).op_err("apply repo data encode failed")
}

fn decode_repo_data(raw: &str) -> Result<ApplyRepoData> {
    serde_json::from_str(raw).op_err("apply repo data decode failed")
}

/// Submits a new apply in `AUDIT_PENDING`.
pub fn create(store: &dyn Store, new: NewApply) -> Result<Apply> {
    let repo_blob = encode_repo_data(&new.repo_data)?;
    let mut record = ApplyRecord {
        id: 0,
        project_id: new.project_id,
        space_id: new.space_id,
        name: new.name,
        description: new.description,
        repo_data: repo_blob,
        status: ApplyStatus::AuditPending,
        error_log: String::new(),
        user_id: new.user_id,
        created_at: timestamp_now(),
    };

    record.id = store.create_apply(&record).op_err("apply submit failed")?;
    tracing::info!(apply_id = record.id, user_id = record.user_id, "apply submitted");

    Ok(Apply {
        id: record.id,
        project_id: record.project_id,
        space_id: record.space_id,
        name: record.name,
        description: record.description,
        repo_data: new.repo_data,
        status: record.status,
        error_log: record.error_log,
        user_id: record.user_id,
        created_at: record.created_at,
    })
}

/// Lists one page of applies visible in `space_ids`, plus the unpaged total.
///
/// The space restriction is always applied, so an empty `space_ids` yields
/// nothing regardless of the other criteria.
pub fn list(
    store: &dyn Store,
    filter: &ApplyFilter,
    space_ids: &[i64],
    page: Page,
) -> Result<(Vec<ApplySummary>, i64)> {
    let query = Filter::new()
        .keyword(&filter.keyword)
        .eq(Field::UserId, filter.user_id)
        .eq(Field::ProjectId, filter.project_id)
        .created_after(filter.created_after)
        .eq(Field::Status, filter.status.map_or(0, ApplyStatus::code))
        .within(Field::SpaceId, space_ids)
        .page(page);

    let rows = store.list_applies(&query).op_err("get apply list failed")?;
    let total = store
        .count_applies(&query.clauses)
        .op_err("get apply total count failed")?;

    Ok((rows, total))
}

/// Loads one apply with its repository reference decoded.
pub fn detail(store: &dyn Store, id: i64) -> Result<Apply> {
    if id == 0 {
        return Err(Error::bad_request("id can not be empty"));
    }

    let record = store
        .get_apply(id)
        .op_err("apply detail get failed")?
        .ok_or(Error::NotFound("apply not exists"))?;
    let repo_data = decode_repo_data(&record.repo_data)?;

    Ok(Apply {
        id: record.id,
        project_id: record.project_id,
        space_id: record.space_id,
        name: record.name,
        description: record.description,
        repo_data,
        status: record.status,
        error_log: record.error_log,
        user_id: record.user_id,
        created_at: record.created_at,
    })
}

/// Writes status and error log without consulting the transition table.
/// Deploy executors own the ordering of the states they report.
pub fn update_status(
    store: &dyn Store,
    id: i64,
    status: ApplyStatus,
    error_log: &str,
) -> Result<()> {
    let update = ApplyUpdate {
        status: Some(status),
        error_log: Some(error_log.to_string()),
        ..Default::default()
    };
    let changed = store
        .update_apply(id, &update)
        .op_err("update apply status failed")?;
    if !changed {
        return Err(Error::NotFound("apply not exists"));
    }
    Ok(())
}

/// Moves an apply to `next` only if the lifecycle allows it.
/// Returns the status it left.
pub fn transition(
    store: &dyn Store,
    id: i64,
    next: ApplyStatus,
    error_log: &str,
) -> Result<ApplyStatus> {
    let current = store
        .get_apply(id)
        .op_err("apply detail get failed")?
        .ok_or(Error::NotFound("apply not exists"))?
        .status;

    if !current.can_transition_to(next) {
        return Err(Error::InvalidTransition {
            from: current.to_string(),
            to: next.to_string(),
        });
    }

    update_status(store, id, next, error_log)?;
    tracing::info!(apply_id = id, from = %current, to = %next, "apply status changed");
    Ok(current)
}

/// Full edit of the mutable fields, re-encoding the repository reference.
pub fn update(store: &dyn Store, id: i64, edit: ApplyEdit) -> Result<()> {
    let update = ApplyUpdate {
        name: Some(edit.name),
        description: Some(edit.description),
        repo_data: Some(encode_repo_data(&edit.repo_data)?),
        status: Some(edit.status),
        error_log: None,
    };
    let changed = store
        .update_apply(id, &update)
        .op_err("update apply data failed")?;
    if !changed {
        return Err(Error::NotFound("apply not exists"));
    }
    Ok(())
}
