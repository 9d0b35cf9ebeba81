use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Store;
use super::query::{Clause, Field, ListQuery, Op, Order, Value};
use crate::error::Result;
use crate::types::*;

/// Exposes a record's columns to clause evaluation.
trait Columns {
    fn id(&self) -> i64;
    fn column(&self, field: Field) -> Option<Value>;
}

impl Columns for Space {
    fn id(&self) -> i64 {
        self.id
    }

    fn column(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Int(self.id)),
            Field::Name => Some(Value::Text(self.name.clone())),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            _ => None,
        }
    }
}

impl Columns for Project {
    fn id(&self) -> i64 {
        self.id
    }

    fn column(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Int(self.id)),
            Field::Name => Some(Value::Text(self.name.clone())),
            Field::SpaceId => Some(Value::Int(self.space_id)),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            _ => None,
        }
    }
}

impl Columns for ApplyRecord {
    fn id(&self) -> i64 {
        self.id
    }

    fn column(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Int(self.id)),
            Field::Name => Some(Value::Text(self.name.clone())),
            Field::UserId => Some(Value::Int(self.user_id)),
            Field::ProjectId => Some(Value::Int(self.project_id)),
            Field::SpaceId => Some(Value::Int(self.space_id)),
            Field::Status => Some(Value::Int(self.status.code())),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            Field::TokenHash => None,
        }
    }
}

impl Columns for UserToken {
    fn id(&self) -> i64 {
        self.id
    }

    fn column(&self, field: Field) -> Option<Value> {
        match field {
            Field::Id => Some(Value::Int(self.id)),
            Field::UserId => Some(Value::Int(self.user_id)),
            Field::TokenHash => Some(Value::Text(self.token_hash.clone())),
            Field::CreatedAt => Some(Value::Time(self.created_at)),
            _ => None,
        }
    }
}

fn matches(record: &impl Columns, clause: &Clause) -> bool {
    let Some(actual) = record.column(clause.field) else {
        return false;
    };
    match (clause.op, &actual, &clause.value) {
        (Op::Eq, a, b) => a == b,
        (Op::NotEq, a, b) => a != b,
        (Op::Like, Value::Text(a), Value::Text(fragment)) => {
            a.to_lowercase().contains(&fragment.to_lowercase())
        }
        (Op::Gt, Value::Int(a), Value::Int(b)) => a > b,
        (Op::Gt, Value::Time(a), Value::Time(b)) => a > b,
        (Op::In, Value::Int(a), Value::IntList(ids)) => ids.contains(a),
        _ => false,
    }
}

fn matches_all(record: &impl Columns, clauses: &[Clause]) -> bool {
    clauses.iter().all(|clause| matches(record, clause))
}

fn select<T: Columns + Clone>(rows: &[T], query: &ListQuery) -> Vec<T> {
    let mut selected: Vec<T> = rows
        .iter()
        .filter(|row| matches_all(*row, &query.clauses))
        .cloned()
        .collect();
    match query.order {
        Order::IdDesc => selected.sort_by_key(|row| std::cmp::Reverse(row.id())),
    }
    selected
        .into_iter()
        .skip(query.page.offset as usize)
        .take(query.page.limit as usize)
        .collect()
}

fn count<T: Columns>(rows: &[T], clauses: &[Clause]) -> i64 {
    rows.iter().filter(|row| matches_all(*row, clauses)).count() as i64
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    spaces: Vec<Space>,
    members: Vec<SpaceMember>,
    projects: Vec<Project>,
    applies: Vec<ApplyRecord>,
    tokens: Vec<UserToken>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store evaluating the same clauses as [`SqliteStore`](super::SqliteStore).
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reads: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tables()
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

impl Store for MemoryStore {
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    // Space operations

    fn create_space(&self, space: &Space) -> Result<i64> {
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.spaces.push(Space { id, ..space.clone() });
        Ok(id)
    }

    fn get_space(&self, id: i64) -> Result<Option<Space>> {
        Ok(self.read().spaces.iter().find(|s| s.id == id).cloned())
    }

    fn list_spaces(&self, query: &ListQuery) -> Result<Vec<Space>> {
        Ok(select(&self.read().spaces, query))
    }

    fn count_spaces(&self, clauses: &[Clause]) -> Result<i64> {
        Ok(count(&self.read().spaces, clauses))
    }

    fn update_space(&self, id: i64, update: &SpaceUpdate) -> Result<bool> {
        let mut tables = self.tables();
        let Some(space) = tables.spaces.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        set(&mut space.name, &update.name);
        set(&mut space.description, &update.description);
        Ok(true)
    }

    fn delete_space(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.spaces.len();
        tables.spaces.retain(|s| s.id != id);
        tables.members.retain(|m| m.space_id != id);
        Ok(tables.spaces.len() < before)
    }

    // Space membership

    fn add_space_member(&self, member: &SpaceMember) -> Result<()> {
        let mut tables = self.tables();
        let exists = tables
            .members
            .iter()
            .any(|m| m.space_id == member.space_id && m.user_id == member.user_id);
        if !exists {
            tables.members.push(member.clone());
        }
        Ok(())
    }

    fn remove_space_member(&self, space_id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.members.len();
        tables
            .members
            .retain(|m| !(m.space_id == space_id && m.user_id == user_id));
        Ok(tables.members.len() < before)
    }

    fn list_member_space_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .read()
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.space_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<i64> {
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.projects.push(Project {
            id,
            ..project.clone()
        });
        Ok(id)
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        Ok(self.read().projects.iter().find(|p| p.id == id).cloned())
    }

    fn list_projects(&self, query: &ListQuery) -> Result<Vec<Project>> {
        Ok(select(&self.read().projects, query))
    }

    fn count_projects(&self, clauses: &[Clause]) -> Result<i64> {
        Ok(count(&self.read().projects, clauses))
    }

    fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<bool> {
        let mut tables = self.tables();
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        set(&mut project.name, &update.name);
        set(&mut project.description, &update.description);
        Ok(true)
    }

    fn delete_project(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        Ok(tables.projects.len() < before)
    }

    // Deploy apply operations

    fn create_apply(&self, apply: &ApplyRecord) -> Result<i64> {
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.applies.push(ApplyRecord {
            id,
            ..apply.clone()
        });
        Ok(id)
    }

    fn get_apply(&self, id: i64) -> Result<Option<ApplyRecord>> {
        Ok(self.read().applies.iter().find(|a| a.id == id).cloned())
    }

    fn list_applies(&self, query: &ListQuery) -> Result<Vec<ApplySummary>> {
        Ok(select(&self.read().applies, query)
            .iter()
            .map(ApplyRecord::summary)
            .collect())
    }

    fn count_applies(&self, clauses: &[Clause]) -> Result<i64> {
        Ok(count(&self.read().applies, clauses))
    }

    fn update_apply(&self, id: i64, update: &ApplyUpdate) -> Result<bool> {
        let mut tables = self.tables();
        let Some(apply) = tables.applies.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        set(&mut apply.name, &update.name);
        set(&mut apply.description, &update.description);
        set(&mut apply.repo_data, &update.repo_data);
        set(&mut apply.status, &update.status);
        set(&mut apply.error_log, &update.error_log);
        Ok(true)
    }

    // User token operations

    fn create_token(&self, token: &UserToken) -> Result<i64> {
        let mut tables = self.tables();
        let id = tables.next_id();
        tables.tokens.push(UserToken {
            id,
            ..token.clone()
        });
        Ok(id)
    }

    fn find_token(&self, clauses: &[Clause]) -> Result<Option<UserToken>> {
        Ok(self
            .read()
            .tokens
            .iter()
            .filter(|t| matches_all(*t, clauses))
            .max_by_key(|t| t.id)
            .cloned())
    }

    fn update_token(&self, id: i64, update: &TokenUpdate) -> Result<bool> {
        let mut tables = self.tables();
        let Some(token) = tables.tokens.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        set(&mut token.token_hash, &update.token_hash);
        set(&mut token.expire_time, &update.expire_time);
        Ok(true)
    }

    fn delete_user_tokens(&self, user_id: i64) -> Result<usize> {
        let mut tables = self.tables();
        let before = tables.tokens.len();
        tables.tokens.retain(|t| t.user_id != user_id);
        Ok(before - tables.tokens.len())
    }
}
