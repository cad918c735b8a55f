use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted record of an issued refresh token.
///
/// Revocation flips `revoked`; records are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

/// Revocation-aware view of a stored refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenStatus {
    Active,
    Revoked,
    Expired,
}

impl RefreshToken {
    pub fn new(user_email: String, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_email,
            token,
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    /// Revocation wins over expiry.
    pub fn status_at(&self, now: DateTime<Utc>) -> RefreshTokenStatus {
        if self.revoked {
            RefreshTokenStatus::Revoked
        } else if self.expires_at <= now {
            RefreshTokenStatus::Expired
        } else {
            RefreshTokenStatus::Active
        }
    }

    pub fn status(&self) -> RefreshTokenStatus {
        self.status_at(Utc::now())
    }
}
