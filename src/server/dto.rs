use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ApplyRepoData, ApplyStatus};

#[derive(Debug, Deserialize)]
pub struct SpaceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpaceExistsParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct SpaceListItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub have_project: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub space_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub space_id: i64,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplyRequest {
    pub project_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repo_data: ApplyRepoData,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repo_data: ApplyRepoData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyListParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub project_id: i64,
    /// Status name or numeric code.
    #[serde(default)]
    pub status: Option<String>,
    /// Unix seconds; only applies created after this instant are returned.
    #[serde(default)]
    pub ctime: i64,
    /// Restrict to the caller's own applies.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuditRequest {
    pub pass: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusReportRequest {
    pub status: ApplyStatus,
    #[serde(default)]
    pub error_log: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub expire_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    pub token: String,
    pub expire_time: DateTime<Utc>,
}
