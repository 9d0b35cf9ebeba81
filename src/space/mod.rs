//! Spaces group projects and gate who can see their applies.

pub mod project;

pub use project::check_space_have_project;

use crate::error::{Error, Result, ResultExt};
use crate::store::{Field, Filter, Page, Store};
use crate::types::{Space, SpaceMember, SpaceUpdate, timestamp_now};

/// Returns true if a space other than `id` already uses `name`.
/// Pass `id = 0` when creating.
pub fn check_exists(store: &dyn Store, id: i64, name: &str) -> Result<bool> {
    let clauses = Filter::new().name_is(name).not_id(id).into_clauses();
    let count = store
        .count_spaces(&clauses)
        .op_err("check space exists failed")?;
    Ok(count > 0)
}

/// Creates a space when `id` is 0, otherwise renames/redescribes it.
pub fn create_or_update(
    store: &dyn Store,
    id: i64,
    name: &str,
    description: &str,
) -> Result<Space> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::bad_request("name can not be empty"));
    }
    if check_exists(store, id, name)? {
        return Err(Error::conflict(
            "space data update failed, space name already exists",
        ));
    }

    if id == 0 {
        let mut space = Space {
            id: 0,
            name: name.to_string(),
            description: description.to_string(),
            created_at: timestamp_now(),
        };
        space.id = store.create_space(&space).op_err("space create failed")?;
        tracing::info!(space_id = space.id, "space created");
        return Ok(space);
    }

    let update = SpaceUpdate {
        name: Some(name.to_string()),
        description: Some(description.to_string()),
    };
    if !store.update_space(id, &update).op_err("space update failed")? {
        return Err(Error::NotFound("space not exists"));
    }
    detail(store, id)
}

/// Lists spaces among `space_ids`, one page at a time, with the unpaged total.
pub fn list(
    store: &dyn Store,
    keyword: &str,
    space_ids: &[i64],
    page: Page,
) -> Result<(Vec<Space>, i64)> {
    let query = Filter::new()
        .keyword(keyword)
        .within(Field::Id, space_ids)
        .page(page);
    let spaces = store.list_spaces(&query).op_err("get space list failed")?;
    let total = store
        .count_spaces(&query.clauses)
        .op_err("get space total count failed")?;
    Ok((spaces, total))
}

pub fn detail(store: &dyn Store, id: i64) -> Result<Space> {
    if id == 0 {
        return Err(Error::bad_request("id can not be empty"));
    }
    store
        .get_space(id)
        .op_err("space detail get failed")?
        .ok_or(Error::NotFound("space not exists"))
}

/// Deletes a space that no longer owns any project. Never cascades.
pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    if id == 0 {
        return Err(Error::bad_request("id can not be empty"));
    }
    if check_space_have_project(store, id)? {
        return Err(Error::conflict(
            "space delete failed, project in space is not empty",
        ));
    }
    if !store.delete_space(id).op_err("space delete failed")? {
        return Err(Error::NotFound("space not exists"));
    }
    tracing::info!(space_id = id, "space deleted");
    Ok(())
}

pub fn add_member(store: &dyn Store, space_id: i64, user_id: i64) -> Result<()> {
    if user_id <= 0 {
        return Err(Error::bad_request("user_id can not be empty"));
    }
    detail(store, space_id)?;
    store
        .add_space_member(&SpaceMember {
            space_id,
            user_id,
            created_at: timestamp_now(),
        })
        .op_err("space member add failed")
}

pub fn remove_member(store: &dyn Store, space_id: i64, user_id: i64) -> Result<()> {
    if !store
        .remove_space_member(space_id, user_id)
        .op_err("space member remove failed")?
    {
        return Err(Error::NotFound("space member not exists"));
    }
    Ok(())
}

/// Spaces whose projects and applies `user_id` may see.
pub fn accessible_space_ids(store: &dyn Store, user_id: i64) -> Result<Vec<i64>> {
    store
        .list_member_space_ids(user_id)
        .op_err("get user space list failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::project::{self, NewProject};
    use crate::store::MemoryStore;

    #[test]
    fn test_duplicate_name_rejected() {
        let store = MemoryStore::new();
        create_or_update(&store, 0, "backend", "").unwrap();

        let err = create_or_update(&store, 0, "backend", "again").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_rename_to_own_name_allowed() {
        let store = MemoryStore::new();
        let space = create_or_update(&store, 0, "backend", "").unwrap();
        let other = create_or_update(&store, 0, "frontend", "").unwrap();

        let updated = create_or_update(&store, space.id, "backend", "api team").unwrap();
        assert_eq!(updated.description, "api team");

        assert!(create_or_update(&store, other.id, "backend", "").is_err());
    }

    #[test]
    fn test_check_exists_excludes_self() {
        let store = MemoryStore::new();
        let space = create_or_update(&store, 0, "ops", "").unwrap();
        assert!(check_exists(&store, 0, "ops").unwrap());
        assert!(!check_exists(&store, space.id, "ops").unwrap());
        assert!(!check_exists(&store, 0, "unused").unwrap());
    }

    #[test]
    fn test_empty_name_is_param_error() {
        let store = MemoryStore::new();
        assert!(create_or_update(&store, 0, "  ", "").unwrap_err().is_param_error());
    }

    #[test]
    fn test_delete_guarded_by_projects() {
        let store = MemoryStore::new();
        let busy = create_or_update(&store, 0, "busy", "").unwrap();
        let idle = create_or_update(&store, 0, "idle", "").unwrap();
        project::create(
            &store,
            NewProject {
                space_id: busy.id,
                name: "web".to_string(),
                description: String::new(),
            },
        )
        .unwrap();

        let err = delete(&store, busy.id).unwrap_err();
        assert!(err.to_string().contains("not empty"));
        assert!(detail(&store, busy.id).is_ok());

        delete(&store, idle.id).unwrap();
        assert!(matches!(
            detail(&store, idle.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_list_limited_to_members() {
        let store = MemoryStore::new();
        let a = create_or_update(&store, 0, "alpha", "").unwrap();
        create_or_update(&store, 0, "beta", "").unwrap();
        add_member(&store, a.id, 9).unwrap();

        let ids = accessible_space_ids(&store, 9).unwrap();
        let (spaces, total) = list(&store, "", &ids, Page::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(spaces[0].name, "alpha");

        remove_member(&store, a.id, 9).unwrap();
        assert!(accessible_space_ids(&store, 9).unwrap().is_empty());
        assert!(remove_member(&store, a.id, 9).is_err());
    }
}
