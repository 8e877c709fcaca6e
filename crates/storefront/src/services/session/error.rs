//! Session lifecycle error types.

use thiserror::Error;

use super::store::StoreError;
use crate::services::tokens::TokenError;

/// Errors from session issuance, rotation, and revocation.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The request carried no refresh token at all.
    #[error("no refresh token provided")]
    MissingRefreshToken,

    /// The refresh token is cryptographically valid but superseded or revoked.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// The token itself failed verification (signature, expiry, kind).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The session store could not be reached. Always fails the operation
    /// closed; a refresh timeout means deny, never grant.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
