use crate::error::{Error, Result, ResultExt};
use crate::store::{Clause, Field, Filter, Op, Page, Store, Value};
use crate::types::{ApplyStatus, Project, ProjectUpdate, timestamp_now};

#[derive(Debug, Clone)]
pub struct NewProject {
    pub space_id: i64,
    pub name: String,
    pub description: String,
}

/// Returns true if at least one project belongs to `space_id`.
pub fn check_space_have_project(store: &dyn Store, space_id: i64) -> Result<bool> {
    // Built by hand so a zero id still filters instead of matching every project.
    let clause = Clause::new(Field::SpaceId, Op::Eq, Value::Int(space_id));
    let count = store
        .count_projects(&[clause])
        .op_err("check space projects failed")?;
    Ok(count > 0)
}

pub fn create(store: &dyn Store, new: NewProject) -> Result<Project> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::bad_request("name can not be empty"));
    }
    if new.space_id == 0 {
        return Err(Error::bad_request("space_id can not be empty"));
    }
    store
        .get_space(new.space_id)
        .op_err("space detail get failed")?
        .ok_or(Error::NotFound("space not exists"))?;

    let mut project = Project {
        id: 0,
        space_id: new.space_id,
        name: name.to_string(),
        description: new.description,
        created_at: timestamp_now(),
    };
    project.id = store
        .create_project(&project)
        .op_err("project create failed")?;
    tracing::info!(project_id = project.id, space_id = project.space_id, "project created");
    Ok(project)
}

pub fn update(store: &dyn Store, id: i64, update: &ProjectUpdate) -> Result<Project> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::bad_request("name can not be empty"));
    }
    if !store
        .update_project(id, update)
        .op_err("project update failed")?
    {
        return Err(Error::NotFound("project not exists"));
    }
    detail(store, id)
}

/// Lists projects among `space_ids`, optionally narrowed to one space.
pub fn list(
    store: &dyn Store,
    keyword: &str,
    space_id: i64,
    space_ids: &[i64],
    page: Page,
) -> Result<(Vec<Project>, i64)> {
    let query = Filter::new()
        .keyword(keyword)
        .eq(Field::SpaceId, space_id)
        .within(Field::SpaceId, space_ids)
        .page(page);
    let projects = store
        .list_projects(&query)
        .op_err("get project list failed")?;
    let total = store
        .count_projects(&query.clauses)
        .op_err("get project total count failed")?;
    Ok((projects, total))
}

pub fn detail(store: &dyn Store, id: i64) -> Result<Project> {
    if id == 0 {
        return Err(Error::bad_request("id can not be empty"));
    }
    store
        .get_project(id)
        .op_err("project detail get failed")?
        .ok_or(Error::NotFound("project not exists"))
}

/// Deletes a project unless an apply against it is still in flight.
pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    let in_flight: Vec<i64> = ApplyStatus::ALL
        .into_iter()
        .filter(|s| !s.is_terminal())
        .map(ApplyStatus::code)
        .collect();
    let clauses = Filter::new()
        .eq(Field::ProjectId, id)
        .within(Field::Status, &in_flight)
        .into_clauses();
    let pending = store
        .count_applies(&clauses)
        .op_err("check project applies failed")?;
    if pending > 0 {
        return Err(Error::conflict(
            "project delete failed, project has applies in progress",
        ));
    }

    if !store.delete_project(id).op_err("project delete failed")? {
        return Err(Error::NotFound("project not exists"));
    }
    Ok(())
}
