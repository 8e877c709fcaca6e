//! Authentication service.
//!
//! Registration and email/password login over the account repository.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use mango_stand_core::Email;

use crate::db::RepositoryError;
use crate::db::accounts::AccountRepository;
use crate::models::account::Account;

/// Minimum display name length.
const MIN_NAME_LENGTH: usize = 6;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
///
/// Handles account registration and password login.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
        }
    }

    /// Register a new account with name, email, and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName` or `AuthError::InvalidEmail` if a
    /// field fails validation, `AuthError::WeakPassword` if the password
    /// doesn't meet requirements, and `AuthError::AccountAlreadyExists` if
    /// the email is already registered.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let account = self
            .accounts
            .create(name.trim(), &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(account)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .accounts
            .find_by_email_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(account)
    }
}

/// Validate a display name: at least six characters, letters plus the
/// punctuation that appears in real names (spaces, hyphens, apostrophes).
fn validate_name(name: &str) -> Result<(), AuthError> {
    let trimmed = name.trim();

    if trimmed.len() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '\'' || c == '-')
    {
        return Err(AuthError::InvalidName(
            "name may only contain letters, spaces, hyphens, and apostrophes".to_owned(),
        ));
    }

    Ok(())
}

/// Validate password meets requirements: minimum length plus at least one
/// lowercase letter, one uppercase letter, and one digit.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain a lowercase letter".to_owned(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::WeakPassword(
            "password must contain an uppercase letter".to_owned(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a digit".to_owned(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_real_names() {
        assert!(validate_name("Maria Jones").is_ok());
        assert!(validate_name("O'Brien-Smith").is_ok());
        assert!(validate_name("  Padded Name  ").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_short_names() {
        assert!(matches!(
            validate_name("Bob"),
            Err(AuthError::InvalidName(_))
        ));
        // Trimmed length is what counts.
        assert!(matches!(
            validate_name("   Al   "),
            Err(AuthError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_name_rejects_disallowed_characters() {
        assert!(matches!(
            validate_name("robot_9000"),
            Err(AuthError::InvalidName(_))
        ));
        assert!(matches!(
            validate_name("x@example"),
            Err(AuthError::InvalidName(_))
        ));
    }

    #[test]
    fn test_validate_password_requires_mixed_classes() {
        assert!(validate_password("Abcde1").is_ok());

        assert!(matches!(
            validate_password("Ab1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("abcdef1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("ABCDEF1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("Abcdefg"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("Hunter2x").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert!(verify_password("Hunter2x", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Hunter2x").unwrap();
        let b = hash_password("Hunter2x").unwrap();
        assert_ne!(a, b);
    }
}
