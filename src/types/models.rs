use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::ApplyStatus;

/// Current time truncated to the second precision the stores persist.
#[must_use]
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceMember {
    pub space_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A deployment target. Every project belongs to exactly one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoMode {
    #[default]
    Branch,
    Tag,
}

/// Repository reference carried by an apply. Persisted as a JSON blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyRepoData {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub repo_mode: RepoMode,
    #[serde(default)]
    pub repo_branch: String,
    #[serde(rename = "repo_tag", default)]
    pub tag: String,
    #[serde(rename = "repo_commit", default)]
    pub commit: String,
}

/// Fully decoded deploy apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apply {
    pub id: i64,
    pub project_id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    pub repo_data: ApplyRepoData,
    pub status: ApplyStatus,
    pub error_log: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Row projection used by list views; the repo blob is never decoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub id: i64,
    pub project_id: i64,
    pub space_id: i64,
    pub name: String,
    pub status: ApplyStatus,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Stored form of an apply, with `repo_data` still encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRecord {
    pub id: i64,
    pub project_id: i64,
    pub space_id: i64,
    pub name: String,
    pub description: String,
    pub repo_data: String,
    pub status: ApplyStatus,
    pub error_log: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ApplyRecord {
    #[must_use]
    pub fn summary(&self) -> ApplySummary {
        ApplySummary {
            id: self.id,
            project_id: self.project_id,
            space_id: self.space_id,
            name: self.name.clone(),
            status: self.status,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip)]
    pub token_hash: String,
    pub expire_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time <= now
    }
}

// Partial updates: only `Some` fields are written.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub repo_data: Option<String>,
    pub status: Option<ApplyStatus>,
    pub error_log: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUpdate {
    pub token_hash: Option<String>,
    pub expire_time: Option<DateTime<Utc>>,
}
