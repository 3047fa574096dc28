use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::SessionRecord;

/// Storage for session records, keyed by identifier.
///
/// Entries are independent of each other, so implementations only need
/// per-key consistency.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches the record stored under `id`.
    async fn get(&self, id: &Uuid) -> Result<Option<SessionRecord>>;

    /// Inserts or overwrites the record under `id`.
    async fn set(&self, id: &Uuid, record: &SessionRecord) -> Result<()>;

    /// Overwrites the record under `id` only if one is still present.
    ///
    /// Returns `false` when the entry vanished in the meantime, so a
    /// write-back never resurrects a session deleted by a concurrent logout.
    async fn replace(&self, id: &Uuid, record: &SessionRecord) -> Result<bool>;

    /// Removes the record under `id`. Removing a missing key is not an error.
    async fn delete(&self, id: &Uuid) -> Result<()>;
}

/// Process-local store. Lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<Uuid, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live and not-yet-reclaimed records.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &Uuid) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.get(id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, id: &Uuid, record: &SessionRecord) -> Result<()> {
        self.sessions.insert(*id, record.clone());
        Ok(())
    }

    async fn replace(&self, id: &Uuid, record: &SessionRecord) -> Result<bool> {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                *entry = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

/// Redis-backed store, `session:{id}` → JSON record.
///
/// Keys are kept `grace_seconds` past the record's own expiry so that an
/// expired session is still reported as expired rather than missing.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
    grace_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager, grace_seconds: u64) -> Self {
        Self {
            redis,
            grace_seconds,
        }
    }

    fn key(id: &Uuid) -> String {
        format!("session:{}", id)
    }

    /// Key lifetime for `record`: what is left of the session plus the grace
    /// period. Never zero, since `EX 0` is rejected by Redis.
    fn retention_seconds(record: &SessionRecord, grace_seconds: u64) -> u64 {
        let remaining = (record.expires_at - record.last_accessed_at)
            .num_seconds()
            .max(0) as u64;
        (remaining + grace_seconds).max(1)
    }

    fn encode(record: &SessionRecord) -> Result<String> {
        sonic_rs::to_string(record)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, id: &Uuid) -> Result<Option<SessionRecord>> {
        let mut redis = self.redis.clone();
        let raw: Option<String> = redis.get(Self::key(id)).await?;

        raw.map(|json| {
            sonic_rs::from_str(&json)
                .map_err(|e| AppError::Internal(format!("Invalid session JSON: {}", e)))
        })
        .transpose()
    }

    async fn set(&self, id: &Uuid, record: &SessionRecord) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis
            .set_ex(
                Self::key(id),
                Self::encode(record)?,
                Self::retention_seconds(record, self.grace_seconds),
            )
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                AppError::Redis(e)
            })?;
        Ok(())
    }

    async fn replace(&self, id: &Uuid, record: &SessionRecord) -> Result<bool> {
        let mut redis = self.redis.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(Self::key(id))
            .arg(Self::encode(record)?)
            .arg("XX")
            .arg("EX")
            .arg(Self::retention_seconds(record, self.grace_seconds))
            .query_async(&mut redis)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, id: &Uuid) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.del(Self::key(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record() -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            principal_id: "1".to_string(),
            username: "user".to_string(),
            role: "user".to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(15),
            last_accessed_at: now,
        }
    }

    #[tokio::test]
    async fn memory_store_set_get_delete() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();

        let stored = record();

        assert!(store.get(&id).await.unwrap().is_none());
        store.set(&id, &stored).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), Some(stored));
        assert_eq!(store.len(), 1);

        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
        store.delete(&id).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn replace_does_not_resurrect_deleted_entries() {
        let store = MemorySessionStore::new();
        let id = Uuid::new_v4();

        assert!(!store.replace(&id, &record()).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());

        store.set(&id, &record()).await.unwrap();
        let mut updated = record();
        updated.role = "admin".to_string();
        assert!(store.replace(&id, &updated).await.unwrap());
        assert_eq!(store.get(&id).await.unwrap().unwrap().role, "admin");
    }

    #[test]
    fn redis_keys_outlive_the_session_by_the_grace_period() {
        let stored = record();
        assert_eq!(RedisSessionStore::retention_seconds(&stored, 3600), 900 + 3600);
        assert_eq!(RedisSessionStore::retention_seconds(&stored, 0), 900);

        let mut touched = stored.clone();
        touched.last_accessed_at = stored.last_accessed_at + Duration::minutes(10);
        assert_eq!(RedisSessionStore::retention_seconds(&touched, 60), 300 + 60);
    }

    #[test]
    fn redis_retention_never_drops_to_zero() {
        let mut stale = record();
        stale.last_accessed_at = stale.expires_at;
        assert_eq!(RedisSessionStore::retention_seconds(&stale, 0), 1);

        stale.last_accessed_at = stale.expires_at + Duration::minutes(5);
        assert_eq!(RedisSessionStore::retention_seconds(&stale, 0), 1);
        assert_eq!(RedisSessionStore::retention_seconds(&stale, 30), 30);
    }

    #[tokio::test]
    #[ignore = "needs a Redis server on 127.0.0.1:6379"]
    async fn redis_replace_only_overwrites_present_keys() {
        let client = redis::Client::open("redis://127.0.0.1:6379").unwrap();
        let manager = ConnectionManager::new(client).await.unwrap();
        let store = RedisSessionStore::new(manager, 60);
        let id = Uuid::new_v4();

        assert!(!store.replace(&id, &record()).await.unwrap());
        assert!(store.get(&id).await.unwrap().is_none());

        store.set(&id, &record()).await.unwrap();
        let mut updated = record();
        updated.role = "admin".to_string();
        assert!(store.replace(&id, &updated).await.unwrap());
        assert_eq!(store.get(&id).await.unwrap().unwrap().role, "admin");

        store.delete(&id).await.unwrap();
        assert!(!store.replace(&id, &updated).await.unwrap());
    }
}
