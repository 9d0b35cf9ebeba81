use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an apply currently sits in the audit-and-release workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplyStatus {
    #[default]
    AuditPending,
    AuditFailed,
    AuditPass,
    DeployIng,
    DeploySuccess,
    DeployFailed,
    Drop,
}

impl ApplyStatus {
    pub const ALL: [ApplyStatus; 7] = [
        Self::AuditPending,
        Self::AuditFailed,
        Self::AuditPass,
        Self::DeployIng,
        Self::DeploySuccess,
        Self::DeployFailed,
        Self::Drop,
    ];

    /// Integer code persisted in the `status` column.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::AuditPending => 1,
            Self::AuditFailed => 2,
            Self::AuditPass => 3,
            Self::DeployIng => 4,
            Self::DeploySuccess => 5,
            Self::DeployFailed => 6,
            Self::Drop => 7,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Option<ApplyStatus> {
        match code {
            1 => Some(Self::AuditPending),
            2 => Some(Self::AuditFailed),
            3 => Some(Self::AuditPass),
            4 => Some(Self::DeployIng),
            5 => Some(Self::DeploySuccess),
            6 => Some(Self::DeployFailed),
            7 => Some(Self::Drop),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuditPending => "AUDIT_PENDING",
            Self::AuditFailed => "AUDIT_FAILED",
            Self::AuditPass => "AUDIT_PASS",
            Self::DeployIng => "DEPLOY_ING",
            Self::DeploySuccess => "DEPLOY_SUCCESS",
            Self::DeployFailed => "DEPLOY_FAILED",
            Self::Drop => "DROP",
        }
    }

    /// Accepts either the status name or its integer code.
    pub fn parse(s: &str) -> Option<ApplyStatus> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
    }

    /// No further transitions leave a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::DeploySuccess | Self::DeployFailed | Self::Drop
        )
    }

    /// A failed deploy is resubmitted as a new apply, never resurrected.
    #[must_use]
    pub const fn can_transition_to(self, next: ApplyStatus) -> bool {
        match (self, next) {
            (Self::AuditPending, Self::AuditFailed | Self::AuditPass) => true,
            (Self::AuditPass, Self::DeployIng) => true,
            (Self::DeployIng, Self::DeploySuccess | Self::DeployFailed) => true,
            (from, Self::Drop) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ApplyStatus> for i64 {
    fn from(status: ApplyStatus) -> Self {
        status.code()
    }
}
