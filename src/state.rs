use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::repositories::session::{MemorySessionStore, RedisSessionStore, SessionStore};
use crate::services::credentials::{CredentialVerifier, FixedCredentials};
use crate::services::sessions::SessionManager;
use crate::services::tokens::TokenIssuer;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Gate in front of both login flows.
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Stateless token issuer/verifier.
    pub tokens: Arc<TokenIssuer>,
    /// Stateful session manager.
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Creates a new `AppState` on the system clock.
    ///
    /// Sessions go to Redis when `REDIS_URL` is configured, to memory otherwise.
    pub async fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match &config.redis_url {
            Some(url) => {
                let redis_client = redis::Client::open(url.as_str())?;
                let redis = ConnectionManager::new(redis_client).await?;
                tracing::info!("✅ Redis session store initialized");
                Arc::new(RedisSessionStore::new(redis, config.session_grace_seconds))
            }
            None => {
                tracing::info!("✅ In-memory session store initialized");
                Arc::new(MemorySessionStore::new())
            }
        };

        Ok(Self::from_parts(
            config,
            Arc::new(SystemClock),
            store,
            Arc::new(FixedCredentials::default()),
        ))
    }

    /// Assembles state from explicit collaborators.
    pub fn from_parts(
        config: &Config,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.credential_ttl, clock.clone());
        let sessions = SessionManager::new(store, config.credential_ttl, clock);

        AppState {
            config: config.clone(),
            credentials,
            tokens: Arc::new(tokens),
            sessions: Arc::new(sessions),
        }
    }
}
