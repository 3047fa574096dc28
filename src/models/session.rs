use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::principal::Principal;

/// Represents a server-side session.
///
/// Lives only in the session store; the client holds nothing but the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The ID of the principal this session belongs to.
    pub principal_id: String,
    pub username: String,
    pub role: String,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
    /// The timestamp of the latest successful check or refresh.
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.principal_id.clone(),
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }

    /// True once `now` is strictly past the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// The result of creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// What a successful check reports about a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub remaining_minutes: i64,
    pub remaining_seconds: i64,
    /// e.g. `14 min 59 sec`
    pub remaining_time: String,
    pub is_valid: bool,
}

impl SessionSnapshot {
    pub fn new(id: Uuid, record: &SessionRecord, now: DateTime<Utc>) -> Self {
        let remaining = (record.expires_at - now).num_seconds().max(0);
        let remaining_minutes = remaining / 60;
        let remaining_seconds = remaining % 60;

        Self {
            id,
            created_at: record.created_at,
            expires_at: record.expires_at,
            last_accessed_at: record.last_accessed_at,
            remaining_minutes,
            remaining_seconds,
            remaining_time: format!("{} min {} sec", remaining_minutes, remaining_seconds),
            is_valid: true,
        }
    }
}

/// A session that passed the lookup and expiry checks.
#[derive(Debug, Clone)]
pub struct CheckedSession {
    pub principal: Principal,
    pub snapshot: SessionSnapshot,
}
