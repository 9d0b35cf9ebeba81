mod memory;
pub mod query;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use query::{Clause, Field, Filter, Keyword, ListQuery, Op, Order, Page, Value};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// `create_*` returns the generated id. `update_*` and `delete_*` report
/// whether a row was affected, so "nothing matched" is never an error.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Space operations
    fn create_space(&self, space: &Space) -> Result<i64>;
    fn get_space(&self, id: i64) -> Result<Option<Space>>;
    fn list_spaces(&self, query: &ListQuery) -> Result<Vec<Space>>;
    fn count_spaces(&self, clauses: &[Clause]) -> Result<i64>;
    fn update_space(&self, id: i64, update: &SpaceUpdate) -> Result<bool>;
    fn delete_space(&self, id: i64) -> Result<bool>;

    // Space membership
    fn add_space_member(&self, member: &SpaceMember) -> Result<()>;
    fn remove_space_member(&self, space_id: i64, user_id: i64) -> Result<bool>;
    fn list_member_space_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    // Project operations
    fn create_project(&self, project: &Project) -> Result<i64>;
    fn get_project(&self, id: i64) -> Result<Option<Project>>;
    fn list_projects(&self, query: &ListQuery) -> Result<Vec<Project>>;
    fn count_projects(&self, clauses: &[Clause]) -> Result<i64>;
    fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<bool>;
    fn delete_project(&self, id: i64) -> Result<bool>;

    // Deploy apply operations
    fn create_apply(&self, apply: &ApplyRecord) -> Result<i64>;
    fn get_apply(&self, id: i64) -> Result<Option<ApplyRecord>>;
    fn list_applies(&self, query: &ListQuery) -> Result<Vec<ApplySummary>>;
    fn count_applies(&self, clauses: &[Clause]) -> Result<i64>;
    fn update_apply(&self, id: i64, update: &ApplyUpdate) -> Result<bool>;

    // User token operations
    fn create_token(&self, token: &UserToken) -> Result<i64>;
    fn find_token(&self, clauses: &[Clause]) -> Result<Option<UserToken>>;
    fn update_token(&self, id: i64, update: &TokenUpdate) -> Result<bool>;
    fn delete_user_tokens(&self, user_id: i64) -> Result<usize>;
}
