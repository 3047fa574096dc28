use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of credential an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    /// A signed bearer token.
    Token,
    /// A server-side session identifier.
    Session,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Token => f.write_str("Token"),
            Artifact::Session => f.write_str("Session"),
        }
    }
}

/// Closed set of failure kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CredentialInvalid,
    ArtifactNotFound,
    ArtifactExpired,
    ArtifactInvalid,
    Internal,
}

impl ErrorKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CredentialInvalid => "credential_invalid",
            ErrorKind::ArtifactNotFound => "artifact_not_found",
            ErrorKind::ArtifactExpired => "artifact_expired",
            ErrorKind::ArtifactInvalid => "artifact_invalid",
            ErrorKind::Internal => "internal",
        }
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Login rejected. Never says whether the username exists.
    #[error("Invalid username or password")]
    CredentialInvalid,

    /// No token or session identifier was presented, or it is unknown.
    #[error("{0} not found")]
    ArtifactNotFound(Artifact),

    /// The credential is past its expiry.
    #[error("{0} has expired")]
    ArtifactExpired(Artifact),

    /// Signature mismatch or malformed credential.
    #[error("{0} verification failed")]
    ArtifactInvalid(Artifact),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Token signing failed.
    #[error("Signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Returns the kind callers should branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CredentialInvalid => ErrorKind::CredentialInvalid,
            AppError::ArtifactNotFound(_) => ErrorKind::ArtifactNotFound,
            AppError::ArtifactExpired(_) => ErrorKind::ArtifactExpired,
            AppError::ArtifactInvalid(_) => ErrorKind::ArtifactInvalid,
            AppError::Redis(_) | AppError::Signing(_) | AppError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::CredentialInvalid => {
                tracing::warn!("Login rejected");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::ArtifactNotFound(artifact) => {
                tracing::debug!("{} not presented or unknown", artifact);
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::ArtifactExpired(artifact) => {
                tracing::debug!("{} expired", artifact);
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::ArtifactInvalid(artifact) => {
                tracing::warn!("{} failed verification", artifact);
                (StatusCode::UNAUTHORIZED, self.to_string())
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store error".to_string())
            }

            AppError::Signing(ref e) => {
                tracing::error!("Signing error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Token signing error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let kind = self.kind();
        let body = sonic_rs::to_string(&sonic_rs::json!({
            "success": false,
            "error": message,
            "kind": kind.as_str()
        }))
        .unwrap_or_else(|_| r#"{"success":false,"error":"Internal server error","kind":"internal"}"#.to_string());

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_and_not_found_are_distinct_kinds() {
        let expired = AppError::ArtifactExpired(Artifact::Session);
        let missing = AppError::ArtifactNotFound(Artifact::Session);

        assert_eq!(expired.kind(), ErrorKind::ArtifactExpired);
        assert_eq!(missing.kind(), ErrorKind::ArtifactNotFound);
        assert_eq!(expired.to_string(), "Session has expired");
        assert_eq!(missing.to_string(), "Session not found");
    }

    #[test]
    fn credential_error_does_not_mention_which_field() {
        let msg = AppError::CredentialInvalid.to_string();
        assert_eq!(msg, "Invalid username or password");
    }

    #[test]
    fn artifact_errors_map_to_unauthorized() {
        let response = AppError::ArtifactInvalid(Artifact::Token).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::CredentialInvalid.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
