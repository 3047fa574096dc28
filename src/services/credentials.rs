use async_trait::async_trait;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};
use crate::models::principal::{Principal, fixture};

/// Checks a username/password pair and yields the principal it belongs to.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Fails with `CredentialInvalid` on any mismatch, without saying which part.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal>;
}

/// A single hard-coded account.
pub struct FixedCredentials {
    principal: Principal,
    username: String,
    password: Zeroizing<String>,
}

impl FixedCredentials {
    pub fn new(principal: Principal, username: &str, password: &str) -> Self {
        Self {
            principal,
            username: username.to_string(),
            password: Zeroizing::new(password.to_string()),
        }
    }
}

impl Default for FixedCredentials {
    /// The demo account, `user` / `password`.
    fn default() -> Self {
        Self::new(Principal::fixture(), fixture::USERNAME, fixture::PASSWORD)
    }
}

#[async_trait]
impl CredentialVerifier for FixedCredentials {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Principal> {
        tracing::debug!("🔐 Authenticating user: {}", username);

        // Both comparisons always run so timing does not reveal which one failed.
        let username_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.password.as_bytes());

        if bool::from(username_ok & password_ok) {
            tracing::info!("✅ User authenticated: {}", self.principal.id);
            Ok(self.principal.clone())
        } else {
            Err(AppError::CredentialInvalid)
        }
    }
}
