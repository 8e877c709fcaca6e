//! Token error types.

use thiserror::Error;

/// Errors from issuing or verifying signed tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature does not verify against the expected key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token is past its expiry.
    #[error("token expired")]
    Expired,

    /// Token verified but carries the wrong kind marker.
    #[error("wrong token kind")]
    WrongKind,

    /// Token is not a structurally valid JWT.
    #[error("malformed token")]
    Malformed,

    /// Signing failed (key or serialization problem).
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Map a jsonwebtoken decode error onto the verification taxonomy.
    pub(super) fn from_decode(err: &jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed,
        }
    }
}
