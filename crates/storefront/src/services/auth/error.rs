//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] mango_stand_core::EmailError),

    /// Display name too short or containing disallowed characters.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
