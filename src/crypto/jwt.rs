use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Artifact, Result};

/// Hex characters kept from a token digest when logging.
const FINGERPRINT_LEN: usize = 12;

/// The three Base64URL parts of a compact token.
#[derive(Debug, Clone, Copy)]
pub struct Segments<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    /// Splits `header.payload.signature`. Anything else is malformed.
    pub fn split(token: &'a str) -> Result<Self> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(payload), Some(signature), None)
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    header,
                    payload,
                    signature,
                })
            }
            _ => Err(AppError::ArtifactInvalid(Artifact::Token)),
        }
    }

    /// The bytes the signature covers.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

/// HMAC-SHA256 over `base64url(header) "." base64url(payload)`.
pub struct Hs256Signer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Signer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Encodes both segments and signs them.
    ///
    /// # Returns
    ///
    /// The compact token and its signature segment.
    pub fn sign<H: Serialize, C: Serialize>(&self, header: &H, claims: &C) -> Result<(String, String)> {
        let signing_input = format!("{}.{}", encode_segment(header)?, encode_segment(claims)?);
        let signature = jsonwebtoken::crypto::sign(
            signing_input.as_bytes(),
            &self.encoding,
            Algorithm::HS256,
        )?;

        Ok((format!("{}.{}", signing_input, signature), signature))
    }

    /// Recomputes the signature over the first two segments.
    pub fn verify(&self, segments: &Segments<'_>) -> bool {
        jsonwebtoken::crypto::verify(
            segments.signature,
            segments.signing_input().as_bytes(),
            &self.decoding,
            Algorithm::HS256,
        )
        .unwrap_or(false)
    }
}

/// Serialises `value` as JSON and Base64URL-encodes it without padding.
pub fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = sonic_rs::to_vec(value)
        .map_err(|e| AppError::Internal(format!("Segment serialization failed: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a Base64URL JSON segment.
pub fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AppError::ArtifactInvalid(Artifact::Token))?;
    sonic_rs::from_slice(&bytes).map_err(|_| AppError::ArtifactInvalid(Artifact::Token))
}

/// Short digest of a token for log lines.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
