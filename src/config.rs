use anyhow::{Context, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use std::env;
use std::net::SocketAddr;
use zeroize::Zeroizing;

/// Size of a generated HMAC secret in bytes.
const GENERATED_SECRET_SIZE: usize = 32;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The HMAC key used to sign tokens.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// Validity window applied to both tokens and sessions.
    pub credential_ttl: chrono::Duration,
    /// The URL of the Redis server. Sessions stay in memory when unset.
    pub redis_url: Option<String>,
    /// How long Redis keeps a record past its expiry.
    pub session_grace_seconds: u64,
    /// Whether cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Seconds it takes a peer to earn back one login attempt.
    pub login_replenish_seconds: u64,
    /// Burst of login attempts allowed per peer.
    pub login_burst: u32,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a new `Config` from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => Zeroizing::new(secret.into_bytes()),
            _ => {
                tracing::warn!(
                    "⚠️ JWT_SECRET not set, generating an ephemeral key (tokens will not survive a restart)"
                );
                let mut bytes = vec![0u8; GENERATED_SECRET_SIZE];
                OsRng.fill_bytes(&mut bytes);
                Zeroizing::new(bytes)
            }
        };

        let ttl_minutes: i64 = lookup("CREDENTIAL_TTL_MINUTES")
            .unwrap_or_else(|| "15".to_string())
            .parse()
            .context("Invalid CREDENTIAL_TTL_MINUTES")?;
        if ttl_minutes <= 0 {
            anyhow::bail!("CREDENTIAL_TTL_MINUTES must be positive");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            bind_addr: lookup("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            jwt_secret,
            credential_ttl: chrono::Duration::minutes(ttl_minutes),
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            session_grace_seconds: lookup("SESSION_GRACE_SECONDS")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .context("Invalid SESSION_GRACE_SECONDS")?,
            secure_cookies: lookup("APP_ENV").unwrap_or_else(|| "development".to_string())
                == "production",
            cors_origins,
            login_replenish_seconds: lookup("LOGIN_REPLENISH_SECONDS")
                .unwrap_or_else(|| "1".to_string())
                .parse()
                .context("Invalid LOGIN_REPLENISH_SECONDS")?,
            login_burst: lookup("LOGIN_BURST")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("Invalid LOGIN_BURST")?,
        })
    }

    /// A development configuration signing with `secret`.
    pub fn with_secret(secret: &[u8]) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            jwt_secret: Zeroizing::new(secret.to_vec()),
            credential_ttl: chrono::Duration::minutes(15),
            redis_url: None,
            session_grace_seconds: 3600,
            secure_cookies: false,
            cors_origins: vec!["http://localhost:3000".to_string()],
            login_replenish_seconds: 1,
            login_burst: 10,
        }
    }
}
