use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Store;
use super::query::{Clause, ListQuery, Op, Order, Value};
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const SPACE_COLUMNS: &str = "id, name, description, created_at";
const PROJECT_COLUMNS: &str = "id, space_id, name, description, created_at";
const APPLY_COLUMNS: &str =
    "id, project_id, space_id, name, description, repo_data, status, error_log, user_id, created_at";
const APPLY_SUMMARY_COLUMNS: &str = "id, project_id, space_id, name, status, user_id, created_at";
const TOKEN_COLUMNS: &str = "id, user_id, token_hash, expire_time, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        register_functions(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database. Mostly useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        register_functions(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }

    fn query_rows<T>(
        &self,
        table: &str,
        columns: &str,
        query: &ListQuery,
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let (where_sql, mut values) = render_where(&query.clauses);
        let order = match query.order {
            Order::IdDesc => "id DESC",
        };
        let sql =
            format!("SELECT {columns} FROM {table}{where_sql} ORDER BY {order} LIMIT ? OFFSET ?");
        values.push(SqlValue::Integer(i64::from(query.page.limit)));
        values.push(SqlValue::Integer(i64::from(query.page.offset)));

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| map(row))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_rows(&self, table: &str, clauses: &[Clause]) -> Result<i64> {
        let (where_sql, values) = render_where(clauses);
        let sql = format!("SELECT COUNT(*) FROM {table}{where_sql}");
        let conn = self.conn();
        conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(Error::from)
    }

    fn update_row(
        &self,
        table: &str,
        id: i64,
        sets: Vec<(&'static str, SqlValue)>,
    ) -> Result<bool> {
        if sets.is_empty() {
            let conn = self.conn();
            let found = conn
                .query_row(
                    &format!("SELECT 1 FROM {table} WHERE id = ?1"),
                    params![id],
                    |_| Ok(()),
                )
                .optional()?;
            return Ok(found.is_some());
        }

        let assignments = sets
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<SqlValue> = sets.into_iter().map(|(_, value)| value).collect();
        values.push(SqlValue::Integer(id));

        let rows = self.conn().execute(
            &format!("UPDATE {table} SET {assignments} WHERE id = ?"),
            params_from_iter(values.iter()),
        )?;
        Ok(rows > 0)
    }

    fn delete_row(&self, table: &str, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        Ok(rows > 0)
    }
}

/// SQLite's `LOWER()` only folds ASCII; substring search needs the same
/// folding as `str::to_lowercase`.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

/// Fixed-width so that text comparison orders the same as time.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Time(v) => SqlValue::Text(format_datetime(v)),
        Value::IntList(_) => SqlValue::Null,
    }
}

/// Renders clauses as ` WHERE ... AND ...` plus the bound values in order.
fn render_where(clauses: &[Clause]) -> (String, Vec<SqlValue>) {
    let mut predicates = Vec::with_capacity(clauses.len());
    let mut values = Vec::new();

    for clause in clauses {
        let column = clause.field.column();
        match (clause.op, &clause.value) {
            (Op::In, Value::IntList(ids)) if ids.is_empty() => {
                predicates.push("0 = 1".to_string());
            }
            (Op::In, Value::IntList(ids)) => {
                let marks = vec!["?"; ids.len()].join(", ");
                predicates.push(format!("{column} IN ({marks})"));
                values.extend(ids.iter().map(|id| SqlValue::Integer(*id)));
            }
            (Op::Like, Value::Text(fragment)) => {
                predicates.push(format!("unicode_lower({column}) LIKE ? ESCAPE '\\'"));
                values.push(SqlValue::Text(escape_like(fragment)));
            }
            (op, value) => {
                let operator = match op {
                    Op::Eq | Op::In | Op::Like => "=",
                    Op::NotEq => "<>",
                    Op::Gt => ">",
                };
                predicates.push(format!("{column} {operator} ?"));
                values.push(to_sql_value(value));
            }
        }
    }

    if predicates.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", predicates.join(" AND ")), values)
    }
}

fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ApplyStatus> {
    let code: i64 = row.get(idx)?;
    ApplyStatus::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

fn space_from_row(row: &Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        space_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn apply_from_row(row: &Row<'_>) -> rusqlite::Result<ApplyRecord> {
    Ok(ApplyRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        space_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        repo_data: row.get(5)?,
        status: status_at(row, 6)?,
        error_log: row.get(7)?,
        user_id: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn apply_summary_from_row(row: &Row<'_>) -> rusqlite::Result<ApplySummary> {
    Ok(ApplySummary {
        id: row.get(0)?,
        project_id: row.get(1)?,
        space_id: row.get(2)?,
        name: row.get(3)?,
        status: status_at(row, 4)?,
        user_id: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<UserToken> {
    Ok(UserToken {
        id: row.get(0)?,
        user_id: row.get(1)?,
        token_hash: row.get(2)?,
        expire_time: parse_datetime(&row.get::<_, String>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn push_text(sets: &mut Vec<(&'static str, SqlValue)>, column: &'static str, v: &Option<String>) {
    if let Some(v) = v {
        sets.push((column, SqlValue::Text(v.clone())));
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Space operations

    fn create_space(&self, space: &Space) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO spaces (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![
                space.name,
                space.description,
                format_datetime(&space.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_space(&self, id: i64) -> Result<Option<Space>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE id = ?1"),
            params![id],
            space_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_spaces(&self, query: &ListQuery) -> Result<Vec<Space>> {
        self.query_rows("spaces", SPACE_COLUMNS, query, space_from_row)
    }

    fn count_spaces(&self, clauses: &[Clause]) -> Result<i64> {
        self.count_rows("spaces", clauses)
    }

    fn update_space(&self, id: i64, update: &SpaceUpdate) -> Result<bool> {
        let mut sets = Vec::new();
        push_text(&mut sets, "name", &update.name);
        push_text(&mut sets, "description", &update.description);
        self.update_row("spaces", id, sets)
    }

    fn delete_space(&self, id: i64) -> Result<bool> {
        self.delete_row("spaces", id)
    }

    // Space membership

    fn add_space_member(&self, member: &SpaceMember) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO space_members (space_id, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                member.space_id,
                member.user_id,
                format_datetime(&member.created_at)
            ],
        )?;
        Ok(())
    }

    fn remove_space_member(&self, space_id: i64, user_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM space_members WHERE space_id = ?1 AND user_id = ?2",
            params![space_id, user_id],
        )?;
        Ok(rows > 0)
    }

    fn list_member_space_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT space_id FROM space_members WHERE user_id = ?1 ORDER BY space_id",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO projects (space_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                project.space_id,
                project.name,
                project.description,
                format_datetime(&project.created_at)
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects(&self, query: &ListQuery) -> Result<Vec<Project>> {
        self.query_rows("projects", PROJECT_COLUMNS, query, project_from_row)
    }

    fn count_projects(&self, clauses: &[Clause]) -> Result<i64> {
        self.count_rows("projects", clauses)
    }

    fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<bool> {
        let mut sets = Vec::new();
        push_text(&mut sets, "name", &update.name);
        push_text(&mut sets, "description", &update.description);
        self.update_row("projects", id, sets)
    }

    fn delete_project(&self, id: i64) -> Result<bool> {
        self.delete_row("projects", id)
    }

    // Deploy apply operations

    fn create_apply(&self, apply: &ApplyRecord) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO deploy_applies
                (project_id, space_id, name, description, repo_data, status, error_log, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                apply.project_id,
                apply.space_id,
                apply.name,
                apply.description,
                apply.repo_data,
                apply.status.code(),
                apply.error_log,
                apply.user_id,
                format_datetime(&apply.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_apply(&self, id: i64) -> Result<Option<ApplyRecord>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {APPLY_COLUMNS} FROM deploy_applies WHERE id = ?1"),
            params![id],
            apply_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_applies(&self, query: &ListQuery) -> Result<Vec<ApplySummary>> {
        self.query_rows(
            "deploy_applies",
            APPLY_SUMMARY_COLUMNS,
            query,
            apply_summary_from_row,
        )
    }

    fn count_applies(&self, clauses: &[Clause]) -> Result<i64> {
        self.count_rows("deploy_applies", clauses)
    }

    fn update_apply(&self, id: i64, update: &ApplyUpdate) -> Result<bool> {
        let mut sets = Vec::new();
        push_text(&mut sets, "name", &update.name);
        push_text(&mut sets, "description", &update.description);
        push_text(&mut sets, "repo_data", &update.repo_data);
        if let Some(status) = update.status {
            sets.push(("status", SqlValue::Integer(status.code())));
        }
        push_text(&mut sets, "error_log", &update.error_log);
        self.update_row("deploy_applies", id, sets)
    }

    // User token operations

    fn create_token(&self, token: &UserToken) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO user_tokens (user_id, token_hash, expire_time, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token.user_id,
                token.token_hash,
                format_datetime(&token.expire_time),
                format_datetime(&token.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn find_token(&self, clauses: &[Clause]) -> Result<Option<UserToken>> {
        let query = ListQuery {
            clauses: clauses.to_vec(),
            page: super::Page::first(),
            order: Order::IdDesc,
        };
        let mut tokens = self.query_rows("user_tokens", TOKEN_COLUMNS, &query, token_from_row)?;
        Ok(tokens.pop())
    }

    fn update_token(&self, id: i64, update: &TokenUpdate) -> Result<bool> {
        let mut sets = Vec::new();
        push_text(&mut sets, "token_hash", &update.token_hash);
        if let Some(expire_time) = &update.expire_time {
            sets.push(("expire_time", SqlValue::Text(format_datetime(expire_time))));
        }
        self.update_row("user_tokens", id, sets)
    }

    fn delete_user_tokens(&self, user_id: i64) -> Result<usize> {
        let rows = self
            .conn()
            .execute("DELETE FROM user_tokens WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }
}
