//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::session::SessionError;
use crate::services::tokens::TokenError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Session(
                    SessionError::StoreUnavailable(_)
                        | SessionError::Token(TokenError::Signing(_)),
                )
                | Self::Cart(CartError::Repository(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = if self.is_server_error() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            match &self {
                Self::Auth(_) => StatusCode::BAD_REQUEST,
                // Credential failures on the session endpoints are client
                // mistakes, not authorization failures on a protected
                // resource.
                Self::Session(_) => StatusCode::BAD_REQUEST,
                Self::Cart(CartError::NotInCart) | Self::NotFound(_) => StatusCode::NOT_FOUND,
                Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                Self::BadRequest(_) => StatusCode::BAD_REQUEST,
                Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                Self::Database(_) | Self::Internal(_) | Self::Cart(CartError::Repository(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        };

        // Don't expose internal error details to clients
        let message = if self.is_server_error() {
            "Internal server error".to_owned()
        } else {
            match &self {
                Self::Auth(err) => match err {
                    AuthError::InvalidCredentials => "Invalid credentials".to_owned(),
                    AuthError::AccountAlreadyExists => {
                        "An account with this email already exists".to_owned()
                    }
                    AuthError::WeakPassword(msg) | AuthError::InvalidName(msg) => msg.clone(),
                    AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                    AuthError::Repository(_) | AuthError::PasswordHash => {
                        "Internal server error".to_owned()
                    }
                },
                Self::Session(err) => match err {
                    SessionError::MissingRefreshToken => "No refresh token provided".to_owned(),
                    SessionError::InvalidRefreshToken
                    | SessionError::Token(
                        TokenError::InvalidSignature
                        | TokenError::Expired
                        | TokenError::WrongKind
                        | TokenError::Malformed,
                    ) => "Invalid refresh token".to_owned(),
                    SessionError::Token(TokenError::Signing(_))
                    | SessionError::StoreUnavailable(_) => "Internal server error".to_owned(),
                },
                Self::Cart(CartError::NotInCart) => "Product not found in cart".to_owned(),
                _ => self.to_string(),
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with accounts.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the account.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_failures_are_bad_requests() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Session(SessionError::MissingRefreshToken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Session(SessionError::InvalidRefreshToken)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_cart_miss_is_not_found() {
        assert_eq!(
            get_status(AppError::Cart(CartError::NotInCart)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_infrastructure_failures_are_opaque() {
        let response =
            AppError::Session(SessionError::StoreUnavailable("pool timed out".to_owned()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
