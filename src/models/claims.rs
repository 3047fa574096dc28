use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::principal::Principal;

/// The protected header of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// The payload embedded in a signed token.
///
/// Never updated in place: a refresh mints a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Principal id.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Username.
    pub name: String,
    pub role: String,
    /// Issued-at, epoch seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiry, epoch seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl TokenClaims {
    /// Rebuilds the principal the claims speak for.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.subject.clone(),
            username: self.name.clone(),
            role: self.role.clone(),
        }
    }

    /// The expiry as a timestamp.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Human-readable expiry, or "unknown" if out of range.
    pub fn expires_display(&self) -> String {
        self.expires_at_utc()
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// `header.payload.signature`, what the client stores.
    pub encoded: String,
    pub header: TokenHeader,
    pub claims: TokenClaims,
    /// The Base64URL signature segment.
    pub signature: String,
}

/// A token that passed signature and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub principal: Principal,
    pub encoded: String,
    pub header: TokenHeader,
    pub claims: TokenClaims,
    pub signature: String,
}
