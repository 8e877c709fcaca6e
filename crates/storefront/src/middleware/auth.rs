//! Authentication middleware and extractors.
//!
//! Provides an extractor for requiring a valid access token on route handlers.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use mango_stand_core::AccountId;

use crate::services::tokens::TokenError;
use crate::state::AppState;

/// Cookie carrying the short-lived access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Extractor that requires a valid access token cookie.
///
/// Verification is a pure signature+expiry check against the access secret;
/// no database or store lookup happens per request.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(account): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, account {account}!")
/// }
/// ```
pub struct RequireAuth(pub AccountId);

/// Error returned when a valid access token is required but absent.
pub enum AuthRejection {
    /// No access token cookie on the request.
    MissingToken,
    /// The access token has expired.
    ExpiredToken,
    /// The access token failed verification.
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Unauthorized - no access token provided",
            Self::ExpiredToken => "Unauthorized - access token expired",
            Self::InvalidToken => "Unauthorized - invalid access token",
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value())
            .ok_or(AuthRejection::MissingToken)?;

        let account = state.sessions().authenticate(token).map_err(|e| match e {
            TokenError::Expired => AuthRejection::ExpiredToken,
            _ => AuthRejection::InvalidToken,
        })?;

        Ok(Self(account))
    }
}
