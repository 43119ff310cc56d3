//! Opaque pagination cursors.
//!
//! A cursor is the page boundary of the active storage backend, signed with
//! the server secret. Clients can hand it back unchanged but cannot point it
//! at another table position: any edit breaks the signature.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::PageMarker;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("invalid pagination cursor")]
    Invalid,

    #[error("failed to encode pagination cursor: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorClaims {
    #[serde(rename = "m")]
    marker: PageMarker,
}

/// Encodes and decodes opaque cursors.
#[derive(Clone)]
pub struct CursorCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl CursorCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Turns a page boundary into an opaque cursor. Equal markers give equal cursors.
    pub fn encode(&self, marker: &PageMarker) -> Result<String, CursorError> {
        let claims = CursorClaims {
            marker: marker.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CursorError::Encoding(e.to_string()))
    }

    /// Recovers the page boundary, rejecting anything not produced by [`Self::encode`].
    pub fn decode(&self, cursor: &str) -> Result<PageMarker, CursorError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = decode::<CursorClaims>(cursor, &self.decoding, &validation)
            .map_err(|_| CursorError::Invalid)?;

        if data.claims.marker.is_empty() {
            return Err(CursorError::Invalid);
        }
        Ok(data.claims.marker)
    }
}

impl std::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> CursorCodec {
        CursorCodec::new(b"cursor-secret")
    }

    fn marker() -> PageMarker {
        PageMarker::new()
            .with("PK", "PRODUCT#7d1c")
            .with("SK", "DETAILS#7d1c")
    }

    #[test]
    fn test_cursor_round_trips_marker() {
        let cursor = codec().encode(&marker()).unwrap();
        assert_eq!(codec().decode(&cursor).unwrap(), marker());
    }

    #[test]
    fn test_cursor_is_deterministic() {
        assert_eq!(
            codec().encode(&marker()).unwrap(),
            codec().encode(&marker()).unwrap()
        );
    }

    #[test]
    fn test_cursor_rejects_tampering() {
        let cursor = codec().encode(&marker()).unwrap();
        let forged_marker = PageMarker::new().with("PK", "USER#1").with("SK", "PROFILE#1");
        let forged = CursorCodec::new(b"guessed").encode(&forged_marker).unwrap();

        assert_eq!(codec().decode(&forged), Err(CursorError::Invalid));
        assert_eq!(
            codec().decode(&format!("{cursor}x")),
            Err(CursorError::Invalid)
        );
        assert_eq!(codec().decode("garbage"), Err(CursorError::Invalid));
    }
}
