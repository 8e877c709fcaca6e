//! Credential codec.
//!
//! Issues and verifies the two signed, time-bounded token kinds. Access
//! tokens are stateless; verifying one never touches storage. Each kind is
//! signed with its own secret, so an access-kind secret cannot forge a
//! refresh-kind token and vice versa.

mod error;

pub use error::TokenError;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use mango_stand_core::AccountId;

/// The two credential kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, stateless; verified by signature and expiry alone.
    Access,
    /// Longer-lived, stateful; valid only while recorded in the session store.
    Refresh,
}

impl TokenKind {
    /// Lifetime of a freshly issued token of this kind.
    #[must_use]
    pub fn lifetime(self) -> Duration {
        match self {
            Self::Access => Duration::minutes(15),
            Self::Refresh => Duration::days(7),
        }
    }
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject: the account the token was issued to.
    sub: AccountId,
    /// Issued at (seconds since epoch).
    iat: i64,
    /// Expiration time (seconds since epoch).
    exp: i64,
    /// Kind marker, checked against what the caller expects.
    kind: TokenKind,
}

/// A signed token together with its expiry instant.
#[derive(Debug, Clone)]
pub struct SignedToken {
    /// The serialized, signed token.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KindKeys {
    fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Issues and verifies signed access/refresh tokens.
///
/// The signing secrets are process-wide read-only configuration, injected
/// once at construction.
pub struct TokenCodec {
    access: KindKeys,
    refresh: KindKeys,
}

impl TokenCodec {
    /// Create a codec from the per-kind signing secrets.
    #[must_use]
    pub fn new(access_secret: &SecretString, refresh_secret: &SecretString) -> Self {
        Self {
            access: KindKeys::from_secret(access_secret),
            refresh: KindKeys::from_secret(refresh_secret),
        }
    }

    const fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Issue a signed token for the subject.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, subject: AccountId, kind: TokenKind) -> Result<SignedToken, TokenError> {
        self.issue_at(subject, kind, Utc::now())
    }

    /// Issue a token as of a given instant. Exposed to tests so they can
    /// produce already-expired tokens.
    pub(crate) fn issue_at(
        &self,
        subject: AccountId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, TokenError> {
        let expires_at = now + kind.lifetime();
        let claims = Claims {
            sub: subject,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            kind,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(TokenError::Signing)?;

        Ok(SignedToken { token, expires_at })
    }

    /// Verify a token and return its subject.
    ///
    /// Checks, in order: signature, expiry, kind marker. Any mismatch fails
    /// closed with its own error.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidSignature`, `TokenError::Expired`,
    /// `TokenError::WrongKind`, or `TokenError::Malformed`.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<AccountId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys(expected).decoding, &validation)
            .map_err(|e| TokenError::from_decode(&e))?;

        if data.claims.kind != expected {
            return Err(TokenError::WrongKind);
        }

        Ok(data.claims.sub)
    }

    /// Decode the subject from a refresh token for revocation purposes.
    ///
    /// The signature and kind marker must be valid, but expiry is not
    /// enforced: revoking an already-expired session is a harmless no-op.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidSignature`, `TokenError::WrongKind`, or
    /// `TokenError::Malformed`.
    pub fn subject_for_revocation(&self, token: &str) -> Result<AccountId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.refresh.decoding, &validation)
            .map_err(|e| TokenError::from_decode(&e))?;

        if data.claims.kind != TokenKind::Refresh {
            return Err(TokenError::WrongKind);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(fill: char) -> SecretString {
        SecretString::from(fill.to_string().repeat(48))
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(&secret('a'), &secret('b'))
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let codec = codec();
        let subject = AccountId::new(7);

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let signed = codec.issue(subject, kind).unwrap();
            assert_eq!(codec.verify(&signed.token, kind).unwrap(), subject);
        }
    }

    #[test]
    fn test_lifetimes() {
        let codec = codec();
        let now = Utc::now();

        let access = codec.issue_at(AccountId::new(1), TokenKind::Access, now).unwrap();
        assert_eq!(access.expires_at, now + Duration::minutes(15));

        let refresh = codec.issue_at(AccountId::new(1), TokenKind::Refresh, now).unwrap();
        assert_eq!(refresh.expires_at, now + Duration::days(7));
    }

    #[test]
    fn test_cross_kind_secret_cannot_forge() {
        // A refresh token presented as an access token fails on signature:
        // the kinds are signed with different secrets.
        let codec = codec();
        let refresh = codec.issue(AccountId::new(3), TokenKind::Refresh).unwrap();

        assert!(matches!(
            codec.verify(&refresh.token, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_kind_marker_checked_even_with_shared_secret() {
        // With identical secrets the signature verifies, so the kind claim
        // is the last line of defense.
        let codec = TokenCodec::new(&secret('s'), &secret('s'));
        let refresh = codec.issue(AccountId::new(3), TokenKind::Refresh).unwrap();

        assert!(matches!(
            codec.verify(&refresh.token, TokenKind::Access),
            Err(TokenError::WrongKind)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let stale = Utc::now() - Duration::minutes(16);
        let signed = codec.issue_at(AccountId::new(4), TokenKind::Access, stale).unwrap();

        assert!(matches!(
            codec.verify(&signed.token, TokenKind::Access),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours = codec();
        let theirs = TokenCodec::new(&secret('x'), &secret('y'));
        let forged = theirs.issue(AccountId::new(9), TokenKind::Refresh).unwrap();

        assert!(matches!(
            ours.verify(&forged.token, TokenKind::Refresh),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.verify("not-a-jwt", TokenKind::Access),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn test_revocation_decode_accepts_expired() {
        let codec = codec();
        let stale = Utc::now() - Duration::days(8);
        let signed = codec.issue_at(AccountId::new(5), TokenKind::Refresh, stale).unwrap();

        // Too old to refresh with...
        assert!(matches!(
            codec.verify(&signed.token, TokenKind::Refresh),
            Err(TokenError::Expired)
        ));
        // ...but still good enough to log out with.
        assert_eq!(
            codec.subject_for_revocation(&signed.token).unwrap(),
            AccountId::new(5)
        );
    }

    #[test]
    fn test_revocation_decode_rejects_access_tokens() {
        let codec = TokenCodec::new(&secret('s'), &secret('s'));
        let access = codec.issue(AccountId::new(5), TokenKind::Access).unwrap();

        assert!(matches!(
            codec.subject_for_revocation(&access.token),
            Err(TokenError::WrongKind)
        ));
    }
}
