use uuid::Uuid;

use crate::error::{AppError, Artifact, Result};

/// Generates a new session identifier.
///
/// Version 4 UUIDs draw 122 bits from the OS CSPRNG, which is the only
/// thing keeping identifiers unguessable. No collision check is made.
pub fn generate_session_id() -> Uuid {
    Uuid::new_v4()
}

/// Parses an identifier presented by a client.
///
/// An empty value counts as absent; anything that is not a UUID is malformed.
pub fn parse_session_id(raw: &str) -> Result<Uuid> {
    if raw.is_empty() {
        return Err(AppError::ArtifactNotFound(Artifact::Session));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::ArtifactInvalid(Artifact::Session))
}
