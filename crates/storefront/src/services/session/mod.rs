//! Session lifecycle manager.
//!
//! Composes the token codec and the session store into the per-subject
//! state machine: Anonymous -> (login) Authenticated -> (logout) Anonymous.
//! Exactly one refresh token is valid per subject at any time; logging in
//! elsewhere supersedes the previous session.

mod error;
pub mod store;

pub use error::SessionError;
pub use store::{PgSessionStore, SessionStore, StoreError};

use chrono::Utc;
use tracing::debug;

use mango_stand_core::AccountId;

use crate::services::tokens::{SignedToken, TokenCodec, TokenError, TokenKind};

/// The access+refresh pair handed out at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-lived access token, verified statelessly per request.
    pub access: SignedToken,
    /// Refresh token, recorded in the store as the subject's only valid one.
    pub refresh: SignedToken,
}

/// Orchestrates issuance, rotation, and revocation of token pairs.
pub struct SessionManager<S> {
    codec: TokenCodec,
    store: S,
}

impl<S: SessionStore> SessionManager<S> {
    /// Create a manager over a codec and a store.
    pub const fn new(codec: TokenCodec, store: S) -> Self {
        Self { codec, store }
    }

    /// Verify an access token. Pure signature+expiry check; the session
    /// store is never consulted, so a revoked session's access token keeps
    /// verifying until its own expiry elapses.
    ///
    /// # Errors
    ///
    /// Returns a `TokenError` describing why verification failed.
    pub fn authenticate(&self, access_token: &str) -> Result<AccountId, TokenError> {
        self.codec.verify(access_token, TokenKind::Access)
    }

    /// Start an authenticated session: issue a fresh pair and record the
    /// refresh token, superseding any prior session for the subject.
    ///
    /// If the store write fails, the whole login fails; nothing is handed
    /// out partially.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StoreUnavailable` if the record cannot be
    /// written.
    pub async fn login(&self, subject: AccountId) -> Result<TokenPair, SessionError> {
        let refresh = self.codec.issue(subject, TokenKind::Refresh)?;
        let access = self.codec.issue(subject, TokenKind::Access)?;

        let ttl = u64::try_from((refresh.expires_at - Utc::now()).num_seconds()).unwrap_or(0);
        self.store.put(subject, &refresh.token, ttl).await?;

        debug!(%subject, "session started");
        Ok(TokenPair { access, refresh })
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// Signature, expiry, and kind are checked before the store is touched,
    /// so forgeries fail fast. The presented token must then be byte-equal
    /// to the stored one; absence or mismatch means it has been superseded
    /// or revoked. The refresh token itself is not rotated here - it only
    /// rotates on login.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` for signature/expiry/kind failures,
    /// `SessionError::InvalidRefreshToken` for superseded or revoked tokens,
    /// and `SessionError::StoreUnavailable` if the store cannot be read.
    pub async fn refresh(&self, presented: &str) -> Result<SignedToken, SessionError> {
        let subject = self.codec.verify(presented, TokenKind::Refresh)?;

        let stored = self.store.get(subject).await?;
        if stored.as_deref() != Some(presented) {
            debug!(%subject, "refresh token superseded or revoked");
            return Err(SessionError::InvalidRefreshToken);
        }

        Ok(self.codec.issue(subject, TokenKind::Access)?)
    }

    /// Revoke the subject's session.
    ///
    /// The presented refresh token must carry a valid signature; an expired
    /// one is still accepted, since revoking a dead session is a harmless
    /// no-op. Store deletion is idempotent, but a store failure is an error,
    /// never a silent success.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` if the token cannot be decoded and
    /// `SessionError::StoreUnavailable` if the record cannot be deleted.
    pub async fn logout(&self, presented: &str) -> Result<(), SessionError> {
        let subject = self.codec.subject_for_revocation(presented)?;
        self.store.delete(subject).await?;

        debug!(%subject, "session revoked");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;
    use secrecy::SecretString;

    use super::*;

    /// In-memory store double. Counts `get` calls so tests can assert which
    /// paths consult the store.
    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
        gets: AtomicUsize,
    }

    impl MemoryStore {
        fn get_calls(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }
    }

    impl SessionStore for &MemoryStore {
        async fn put(
            &self,
            subject: AccountId,
            token: &str,
            _ttl_seconds: u64,
        ) -> Result<(), StoreError> {
            self.entries
                .lock()
                .unwrap()
                .insert(store::store_key(subject), token.to_owned());
            Ok(())
        }

        async fn get(&self, subject: AccountId) -> Result<Option<String>, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .entries
                .lock()
                .unwrap()
                .get(&store::store_key(subject))
                .cloned())
        }

        async fn delete(&self, subject: AccountId) -> Result<(), StoreError> {
            self.entries.lock().unwrap().remove(&store::store_key(subject));
            Ok(())
        }
    }

    /// Store double that is always down.
    struct UnavailableStore;

    impl SessionStore for UnavailableStore {
        async fn put(&self, _: AccountId, _: &str, _: u64) -> Result<(), StoreError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn get(&self, _: AccountId) -> Result<Option<String>, StoreError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }

        async fn delete(&self, _: AccountId) -> Result<(), StoreError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(
            &SecretString::from("a".repeat(48)),
            &SecretString::from("b".repeat(48)),
        )
    }

    fn manager(store: &MemoryStore) -> SessionManager<&MemoryStore> {
        SessionManager::new(codec(), store)
    }

    #[tokio::test]
    async fn test_login_issues_pair_and_records_refresh() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let subject = AccountId::new(1);

        let pair = sessions.login(subject).await.unwrap();

        assert_eq!(sessions.authenticate(&pair.access.token).unwrap(), subject);
        let recorded = store
            .entries
            .lock()
            .unwrap()
            .get("refresh_token:1")
            .cloned();
        assert_eq!(recorded.as_deref(), Some(pair.refresh.token.as_str()));
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first_session() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let subject = AccountId::new(1);

        let first = sessions.login(subject).await.unwrap();
        let second = sessions.login(subject).await.unwrap();

        assert!(matches!(
            sessions.refresh(&first.refresh.token).await,
            Err(SessionError::InvalidRefreshToken)
        ));
        assert!(sessions.refresh(&second.refresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_does_not_rotate_refresh_token() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let pair = sessions.login(AccountId::new(2)).await.unwrap();

        let before = store.entries.lock().unwrap().clone();
        sessions.refresh(&pair.refresh.token).await.unwrap();
        let after = store.entries.lock().unwrap().clone();

        assert_eq!(before, after);
        // The same refresh token keeps working.
        assert!(sessions.refresh(&pair.refresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_after_logout_is_invalid() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let pair = sessions.login(AccountId::new(3)).await.unwrap();

        sessions.logout(&pair.refresh.token).await.unwrap();

        assert!(matches!(
            sessions.refresh(&pair.refresh.token).await,
            Err(SessionError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_forged_refresh_fails_before_store_lookup() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        sessions.login(AccountId::new(4)).await.unwrap();

        let foreign = TokenCodec::new(
            &SecretString::from("p".repeat(48)),
            &SecretString::from("q".repeat(48)),
        );
        let forged = foreign.issue(AccountId::new(4), TokenKind::Refresh).unwrap();

        let gets_before = store.get_calls();
        assert!(matches!(
            sessions.refresh(&forged.token).await,
            Err(SessionError::Token(TokenError::InvalidSignature))
        ));
        assert_eq!(store.get_calls(), gets_before);
    }

    #[tokio::test]
    async fn test_access_verification_never_consults_store() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let pair = sessions.login(AccountId::new(5)).await.unwrap();

        sessions.logout(&pair.refresh.token).await.unwrap();

        // The still-unexpired access token verifies after revocation, and
        // verifying it performs no store reads.
        let gets_before = store.get_calls();
        assert!(sessions.authenticate(&pair.access.token).is_ok());
        assert_eq!(store.get_calls(), gets_before);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_at_store_level() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let pair = sessions.login(AccountId::new(6)).await.unwrap();

        sessions.logout(&pair.refresh.token).await.unwrap();
        sessions.logout(&pair.refresh.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_accepts_expired_refresh_token() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let subject = AccountId::new(7);
        sessions.login(subject).await.unwrap();

        let expired = codec()
            .issue_at(subject, TokenKind::Refresh, Utc::now() - Duration::days(8))
            .unwrap();

        sessions.logout(&expired.token).await.unwrap();
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_session_lifecycle() {
        let store = MemoryStore::default();
        let sessions = manager(&store);
        let subject = AccountId::new(9);

        // Login: fresh pair, store records the refresh token.
        let pair = sessions.login(subject).await.unwrap();
        assert_eq!(sessions.authenticate(&pair.access.token).unwrap(), subject);
        assert_eq!(store.entries.lock().unwrap().len(), 1);

        // Refresh: new access token verifies, refresh record untouched.
        let before = store.entries.lock().unwrap().clone();
        let access = sessions.refresh(&pair.refresh.token).await.unwrap();
        assert_eq!(sessions.authenticate(&access.token).unwrap(), subject);
        assert_eq!(*store.entries.lock().unwrap(), before);

        // Logout: record gone.
        sessions.logout(&pair.refresh.token).await.unwrap();
        assert!(store.entries.lock().unwrap().is_empty());

        // The logged-out refresh token no longer works.
        assert!(matches!(
            sessions.refresh(&pair.refresh.token).await,
            Err(SessionError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_store_outage_fails_closed() {
        let sessions = SessionManager::new(codec(), UnavailableStore);
        let subject = AccountId::new(8);

        assert!(matches!(
            sessions.login(subject).await,
            Err(SessionError::StoreUnavailable(_))
        ));

        let refresh = codec().issue(subject, TokenKind::Refresh).unwrap();
        assert!(matches!(
            sessions.refresh(&refresh.token).await,
            Err(SessionError::StoreUnavailable(_))
        ));
        assert!(matches!(
            sessions.logout(&refresh.token).await,
            Err(SessionError::StoreUnavailable(_))
        ));
    }
}
