//! Authoritative refresh-token store.
//!
//! The store maps a subject to its one currently valid refresh token,
//! with an expiry matching the token's remaining lifetime. Absence of a
//! record, or a mismatch with the presented token, means the token is
//! invalid regardless of signature - this is the revocation mechanism.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use thiserror::Error;

use mango_stand_core::AccountId;

/// The store could not complete an operation.
///
/// Carries only a message; the caller treats every store failure the same
/// way (fail closed).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self(err.to_string())
    }
}

/// Record key for a subject's refresh token.
#[must_use]
pub fn store_key(subject: AccountId) -> String {
    format!("refresh_token:{subject}")
}

/// Key-value interface over the session store.
///
/// `put` fully replaces any prior value atomically from the caller's
/// perspective; `delete` is idempotent. Implementations must be safe for
/// concurrent use.
pub trait SessionStore: Send + Sync {
    /// Record `token` as the subject's sole valid refresh token for
    /// `ttl_seconds`, overwriting any existing record.
    fn put(
        &self,
        subject: AccountId,
        token: &str,
        ttl_seconds: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch the subject's current refresh token, if any unexpired record
    /// exists.
    fn get(
        &self,
        subject: AccountId,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Remove the subject's record. Absence is not an error.
    fn delete(&self, subject: AccountId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Postgres-backed session store.
///
/// Rows carry an `expires_at` column; reads filter expired rows so TTL
/// semantics hold even before the sweep removes them.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop rows whose TTL has elapsed. Called opportunistically from `put`.
    async fn sweep(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_session WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl SessionStore for PgSessionStore {
    async fn put(
        &self,
        subject: AccountId,
        token: &str,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        self.sweep().await?;

        let expires_at = Utc::now() + Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(0));

        sqlx::query(
            "INSERT INTO refresh_session (key, token, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO UPDATE \
             SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at",
        )
        .bind(store_key(subject))
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, subject: AccountId) -> Result<Option<String>, StoreError> {
        let token = sqlx::query_scalar::<_, String>(
            "SELECT token FROM refresh_session WHERE key = $1 AND expires_at > now()",
        )
        .bind(store_key(subject))
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn delete(&self, subject: AccountId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_session WHERE key = $1")
            .bind(store_key(subject))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_format() {
        assert_eq!(store_key(AccountId::new(42)), "refresh_token:42");
    }
}
