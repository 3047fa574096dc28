//! Stateful credentials: the client holds an opaque key, the server holds the truth.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::clock::Clock;
use crate::crypto::session_id::{generate_session_id, parse_session_id};
use crate::error::{AppError, Artifact, Result};
use crate::models::principal::Principal;
use crate::models::session::{CheckedSession, NewSession, SessionRecord, SessionSnapshot};
use crate::repositories::session::SessionStore;

/// Creates, checks, extends and deletes sessions.
///
/// Expired records are only reclaimed when someone next touches them.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, ttl, clock }
    }

    /// Opens a session for `principal`.
    ///
    /// # Arguments
    ///
    /// * `principal` - The authenticated principal.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new identifier and its expiry.
    pub async fn create(&self, principal: &Principal) -> Result<NewSession> {
        let id = generate_session_id();
        let now = self.clock.now();
        let record = SessionRecord {
            principal_id: principal.id.clone(),
            username: principal.username.clone(),
            role: principal.role.clone(),
            created_at: now,
            expires_at: now + self.ttl,
            last_accessed_at: now,
        };

        self.store.set(&id, &record).await?;
        tracing::info!("✅ Session created for user: {}", principal.id);

        Ok(NewSession {
            id,
            expires_at: record.expires_at,
        })
    }

    /// Looks up a session and marks it as accessed.
    ///
    /// # Arguments
    ///
    /// * `raw_id` - The identifier as presented by the client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the principal and a snapshot of the session.
    pub async fn check(&self, raw_id: &str) -> Result<CheckedSession> {
        let (id, mut record, now) = self.load_live(raw_id).await?;

        record.last_accessed_at = now;
        if !self.store.replace(&id, &record).await? {
            tracing::debug!("Session removed while being checked");
            return Err(AppError::ArtifactNotFound(Artifact::Session));
        }

        Ok(CheckedSession {
            principal: record.principal(),
            snapshot: SessionSnapshot::new(id, &record, now),
        })
    }

    /// Pushes the expiry to one TTL from now. The identifier is not rotated.
    ///
    /// # Arguments
    ///
    /// * `raw_id` - The identifier as presented by the client.
    ///
    /// # Returns
    ///
    /// The new expiry.
    pub async fn refresh(&self, raw_id: &str) -> Result<DateTime<Utc>> {
        let (id, mut record, now) = self.load_live(raw_id).await?;

        record.expires_at = now + self.ttl;
        record.last_accessed_at = now;
        if !self.store.replace(&id, &record).await? {
            tracing::debug!("Session removed while being refreshed");
            return Err(AppError::ArtifactNotFound(Artifact::Session));
        }

        tracing::info!("🔄 Session extended for user: {}", record.principal_id);
        Ok(record.expires_at)
    }

    /// Deletes a session. Unknown or malformed identifiers are ignored.
    ///
    /// # Arguments
    ///
    /// * `raw_id` - The identifier as presented by the client.
    ///
    /// # Returns
    ///
    /// A `Result<()>`; only a store failure is an error.
    pub async fn revoke(&self, raw_id: &str) -> Result<()> {
        let Ok(id) = parse_session_id(raw_id) else {
            return Ok(());
        };

        self.store.delete(&id).await?;
        tracing::info!("👋 Session deleted");
        Ok(())
    }

    /// Shared not-found and expired checks. Expired records are deleted here.
    async fn load_live(&self, raw_id: &str) -> Result<(uuid::Uuid, SessionRecord, DateTime<Utc>)> {
        let id = parse_session_id(raw_id).inspect_err(|e| {
            if matches!(e, AppError::ArtifactInvalid(_)) {
                tracing::warn!("❌ Malformed session identifier presented");
            }
        })?;

        let record = self
            .store
            .get(&id)
            .await?
            .ok_or(AppError::ArtifactNotFound(Artifact::Session))?;

        let now = self.clock.now();
        if record.is_expired_at(now) {
            tracing::debug!("⌛ Session expired for user: {}", record.principal_id);
            self.store.delete(&id).await?;
            return Err(AppError::ArtifactExpired(Artifact::Session));
        }

        Ok((id, record, now))
    }
}
