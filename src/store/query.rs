//! Typed predicate clauses shared by every list operation.
//!
//! Callers describe what they want with a [`Filter`]; each [`Store`](super::Store)
//! implementation decides how to evaluate the resulting [`Clause`] list.

use chrono::{DateTime, Utc};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    UserId,
    ProjectId,
    SpaceId,
    Status,
    CreatedAt,
    TokenHash,
}

impl Field {
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::UserId => "user_id",
            Self::ProjectId => "project_id",
            Self::SpaceId => "space_id",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::TokenHash => "token_hash",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    /// Case-insensitive substring match.
    Like,
    Gt,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
    IntList(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: Field,
    pub op: Op,
    pub value: Value,
}

impl Clause {
    #[must_use]
    pub fn new(field: Field, op: Op, value: Value) -> Self {
        Self { field, op, value }
    }
}

/// A free-text search box value: users may type either an id or part of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    ExactId(i64),
    NameContains(String),
}

impl Keyword {
    /// Returns `None` when the keyword adds no constraint: empty input, or an
    /// integer that cannot be an identifier.
    pub fn parse(raw: &str) -> Option<Keyword> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Some(Self::ExactId(id)),
            Ok(_) => None,
            Err(_) => Some(Self::NameContains(raw.to_string())),
        }
    }

    #[must_use]
    pub fn into_clause(self) -> Clause {
        match self {
            Self::ExactId(id) => Clause::new(Field::Id, Op::Eq, Value::Int(id)),
            Self::NameContains(fragment) => {
                Clause::new(Field::Name, Op::Like, Value::Text(fragment))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Most recent first.
    #[default]
    IdDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    #[must_use]
    pub fn new(offset: u32, limit: u32) -> Self {
        let limit = match limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        Self { offset, limit }
    }

    /// Fetches at most one row; used for single-row lookups by filter.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            offset: 0,
            limit: 1,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub clauses: Vec<Clause>,
    pub page: Page,
    pub order: Order,
}

/// Builder that drops unspecified criteria: zero ids, empty strings and
/// missing time floors never become clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn keyword(mut self, raw: &str) -> Self {
        if let Some(keyword) = Keyword::parse(raw) {
            self.clauses.push(keyword.into_clause());
        }
        self
    }

    #[must_use]
    pub fn eq(mut self, field: Field, value: i64) -> Self {
        if value != 0 {
            self.clauses.push(Clause::new(field, Op::Eq, Value::Int(value)));
        }
        self
    }

    #[must_use]
    pub fn name_is(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.clauses
                .push(Clause::new(Field::Name, Op::Eq, Value::Text(name.to_string())));
        }
        self
    }

    #[must_use]
    pub fn text_eq(mut self, field: Field, value: &str) -> Self {
        if !value.is_empty() {
            self.clauses
                .push(Clause::new(field, Op::Eq, Value::Text(value.to_string())));
        }
        self
    }

    /// Excludes one record, e.g. the row being renamed.
    #[must_use]
    pub fn not_id(mut self, id: i64) -> Self {
        if id != 0 {
            self.clauses
                .push(Clause::new(Field::Id, Op::NotEq, Value::Int(id)));
        }
        self
    }

    #[must_use]
    pub fn created_after(mut self, floor: Option<DateTime<Utc>>) -> Self {
        if let Some(floor) = floor {
            self.clauses
                .push(Clause::new(Field::CreatedAt, Op::Gt, Value::Time(floor)));
        }
        self
    }

    /// Set membership is always applied; an empty set matches nothing.
    #[must_use]
    pub fn within(mut self, field: Field, ids: &[i64]) -> Self {
        self.clauses
            .push(Clause::new(field, Op::In, Value::IntList(ids.to_vec())));
        self
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[must_use]
    pub fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }

    #[must_use]
    pub fn page(self, page: Page) -> ListQuery {
        ListQuery {
            clauses: self.clauses,
            page,
            order: Order::IdDesc,
        }
    }
}
