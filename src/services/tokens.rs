//! Stateless credentials: everything needed to validate a token is inside it.
//!
//! Nothing here touches shared mutable state. The only server-side input is
//! the signing secret, read once at startup.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::clock::Clock;
use crate::crypto::jwt::{self, Hs256Signer, Segments};
use crate::error::{AppError, Artifact, Result};
use crate::models::claims::{SignedToken, TokenClaims, TokenHeader, VerifiedToken};
use crate::models::principal::Principal;

/// Issues and verifies HS256 tokens.
pub struct TokenIssuer {
    signer: Hs256Signer,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            signer: Hs256Signer::new(secret),
            ttl,
            clock,
        }
    }

    /// The validity window given to every new token.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token for `principal`, valid from now for one TTL.
    ///
    /// # Arguments
    ///
    /// * `principal` - The authenticated principal.
    ///
    /// # Returns
    ///
    /// A `Result` containing the encoded token and its structured parts.
    pub fn issue(&self, principal: &Principal) -> Result<SignedToken> {
        let now = self.clock.now().timestamp();
        let claims = TokenClaims {
            subject: principal.id.clone(),
            name: principal.username.clone(),
            role: principal.role.clone(),
            issued_at: now,
            expires_at: now + self.ttl.num_seconds(),
        };
        let header = TokenHeader::default();
        let (encoded, signature) = self.signer.sign(&header, &claims)?;

        tracing::debug!(
            "🔑 Issued token {} for {} (exp {})",
            jwt::fingerprint(&encoded),
            claims.subject,
            claims.expires_at
        );

        Ok(SignedToken {
            encoded,
            header,
            claims,
            signature,
        })
    }

    /// Checks the signature, then the expiry.
    ///
    /// A pure function of the token, the secret and the clock.
    ///
    /// # Arguments
    ///
    /// * `token` - The compact token as presented by the client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the principal, claims, header and signature.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken> {
        if token.is_empty() {
            return Err(AppError::ArtifactNotFound(Artifact::Token));
        }

        let segments = Segments::split(token).inspect_err(|_| {
            tracing::warn!("❌ Malformed token {}", jwt::fingerprint(token));
        })?;

        if !self.signer.verify(&segments) {
            tracing::warn!("❌ Signature mismatch on token {}", jwt::fingerprint(token));
            return Err(AppError::ArtifactInvalid(Artifact::Token));
        }

        let header: TokenHeader = jwt::decode_segment(segments.header)?;
        let claims: TokenClaims = jwt::decode_segment(segments.payload)?;

        let now = self.clock.now().timestamp();
        if claims.expires_at < now {
            tracing::debug!(
                "⌛ Token {} expired at {}",
                jwt::fingerprint(token),
                claims.expires_at
            );
            return Err(AppError::ArtifactExpired(Artifact::Token));
        }

        Ok(VerifiedToken {
            principal: claims.principal(),
            encoded: token.to_string(),
            header,
            signature: segments.signature.to_string(),
            claims,
        })
    }

    /// Mints a replacement token from a still-valid one.
    ///
    /// The identity claims of the old token are trusted as-is. The old token
    /// keeps verifying until its own expiry if anyone still holds it.
    ///
    /// # Arguments
    ///
    /// * `token` - The compact token as presented by the client.
    ///
    /// # Returns
    ///
    /// A `Result` containing the replacement token.
    pub fn refresh(&self, token: &str) -> Result<SignedToken> {
        let verified = self.verify(token)?;
        let fresh = self.issue(&verified.principal)?;

        tracing::info!(
            "🔄 Token {} replaced by {}",
            jwt::fingerprint(token),
            jwt::fingerprint(&fresh.encoded)
        );
        Ok(fresh)
    }

    /// Forgets a token on the client's behalf. Nothing server-side changes.
    ///
    /// # Arguments
    ///
    /// * `token` - The token being discarded, if the client had one.
    ///
    /// # Returns
    ///
    /// The instant until which the discarded token would still verify, or
    /// `None` if it was not valid to begin with.
    pub fn revoke(&self, token: Option<&str>) -> Option<DateTime<Utc>> {
        let verified = self.verify(token?).ok()?;
        let still_valid_until = verified.claims.expires_at_utc();

        tracing::info!(
            "👋 Token {} discarded; it remains valid until {}",
            jwt::fingerprint(&verified.encoded),
            verified.claims.expires_display()
        );
        still_valid_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn issuer() -> (TokenIssuer, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let issuer = TokenIssuer::new(b"your-jwt-secret-key", Duration::minutes(15), clock.clone());
        (issuer, clock)
    }

    /// Replaces one character of the segment at `index` with a different Base64URL character.
    fn tamper(token: &str, index: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let segment = &mut parts[index];
        let first = segment.remove(0);
        segment.insert(0, if first == 'e' { 'f' } else { 'e' });
        parts.join(".")
    }

    #[test]
    fn verify_accepts_what_issue_produced() {
        let (issuer, _) = issuer();
        let principal = Principal::fixture();

        let token = issuer.issue(&principal).unwrap();
        let verified = issuer.verify(&token.encoded).unwrap();

        assert_eq!(verified.principal, principal);
        assert_eq!(verified.claims, token.claims);
        assert_eq!(verified.header, TokenHeader::default());
        assert_eq!(verified.signature, token.signature);
        assert_eq!(token.claims.expires_at - token.claims.issued_at, 15 * 60);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let (issuer, clock) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();

        clock.advance(Duration::minutes(16));

        assert!(matches!(
            issuer.verify(&token.encoded),
            Err(AppError::ArtifactExpired(Artifact::Token))
        ));
    }

    #[test]
    fn token_is_still_valid_at_its_exact_expiry() {
        let (issuer, clock) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();

        clock.advance(Duration::minutes(15));
        assert!(issuer.verify(&token.encoded).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(issuer.verify(&token.encoded).is_err());
    }

    #[test]
    fn tampered_header_or_payload_fails_signature_check() {
        let (issuer, _) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();

        for index in [0, 1] {
            let forged = tamper(&token.encoded, index);
            assert_ne!(forged, token.encoded);
            assert!(matches!(
                issuer.verify(&forged),
                Err(AppError::ArtifactInvalid(Artifact::Token))
            ));
        }
    }

    #[test]
    fn forged_payload_with_elevated_role_is_rejected() {
        let (issuer, _) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();
        let segments = Segments::split(&token.encoded).unwrap();

        let mut claims = token.claims.clone();
        claims.role = "admin".to_string();
        let forged = format!(
            "{}.{}.{}",
            segments.header,
            jwt::encode_segment(&claims).unwrap(),
            segments.signature
        );

        assert!(matches!(
            issuer.verify(&forged),
            Err(AppError::ArtifactInvalid(Artifact::Token))
        ));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let (issuer, clock) = issuer();
        let other = TokenIssuer::new(b"some-other-secret", Duration::minutes(15), clock);
        let token = other.issue(&Principal::fixture()).unwrap();

        assert!(matches!(
            issuer.verify(&token.encoded),
            Err(AppError::ArtifactInvalid(Artifact::Token))
        ));
    }

    #[test]
    fn empty_and_malformed_tokens() {
        let (issuer, _) = issuer();
        assert!(matches!(
            issuer.verify(""),
            Err(AppError::ArtifactNotFound(Artifact::Token))
        ));
        assert!(matches!(
            issuer.verify("not-a-token"),
            Err(AppError::ArtifactInvalid(Artifact::Token))
        ));
    }

    #[test]
    fn refresh_keeps_identity_and_moves_the_window() {
        let (issuer, clock) = issuer();
        let original = issuer.issue(&Principal::fixture()).unwrap();

        clock.advance(Duration::minutes(10));
        let refreshed = issuer.refresh(&original.encoded).unwrap();

        assert_eq!(refreshed.claims.subject, original.claims.subject);
        assert_eq!(refreshed.claims.name, original.claims.name);
        assert_eq!(refreshed.claims.role, original.claims.role);
        assert_eq!(refreshed.claims.issued_at, original.claims.issued_at + 600);
        assert_eq!(refreshed.claims.expires_at, original.claims.expires_at + 600);
        assert_ne!(refreshed.signature, original.signature);
    }

    #[test]
    fn refresh_leaves_the_old_token_valid() {
        let (issuer, clock) = issuer();
        let original = issuer.issue(&Principal::fixture()).unwrap();

        clock.advance(Duration::minutes(1));
        issuer.refresh(&original.encoded).unwrap();

        assert!(issuer.verify(&original.encoded).is_ok());
    }

    #[test]
    fn refresh_propagates_verification_errors() {
        let (issuer, clock) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();

        assert!(matches!(
            issuer.refresh(""),
            Err(AppError::ArtifactNotFound(Artifact::Token))
        ));
        assert!(matches!(
            issuer.refresh(&tamper(&token.encoded, 1)),
            Err(AppError::ArtifactInvalid(Artifact::Token))
        ));

        clock.advance(Duration::minutes(16));
        assert!(matches!(
            issuer.refresh(&token.encoded),
            Err(AppError::ArtifactExpired(Artifact::Token))
        ));
    }

    #[test]
    fn revoke_cannot_invalidate_a_token() {
        let (issuer, _) = issuer();
        let token = issuer.issue(&Principal::fixture()).unwrap();

        let still_valid_until = issuer.revoke(Some(&token.encoded));

        assert_eq!(still_valid_until, token.claims.expires_at_utc());
        assert!(issuer.verify(&token.encoded).is_ok());
        assert_eq!(issuer.revoke(None), None);
        assert_eq!(issuer.revoke(Some("garbage")), None);
    }
}
