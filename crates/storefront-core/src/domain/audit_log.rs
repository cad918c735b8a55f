use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
        }
    }
}

/// Append-only trace of a significant user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_email: String,
    pub action: String,
    pub detail: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        user_email: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
        status: AuditStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_email: user_email.into(),
            action: action.into(),
            detail: detail.into(),
            status,
            created_at: Utc::now(),
        }
    }

    pub fn success(
        user_email: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(user_email, action, detail, AuditStatus::Success)
    }

    pub fn failed(
        user_email: impl Into<String>,
        action: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(user_email, action, detail, AuditStatus::Failed)
    }
}
