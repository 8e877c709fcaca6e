//! Authentication routes.
//!
//! JSON API endpoints for signup, login, logout, and access token refresh.
//! Both credentials travel as `HttpOnly` cookies; see [`token_cookie`] for
//! the attribute set.

use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use mango_stand_core::{AccountId, Role};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::account::{Account, CartLine};
use crate::services::auth::AuthService;
use crate::services::session::{SessionError, TokenPair};
use crate::services::tokens::SignedToken;
use crate::state::AppState;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account as exposed to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub cart: Vec<CartLine>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email.as_str().to_owned(),
            role: account.role,
            cart: account.cart,
        }
    }
}

/// Register a new account and start a session.
///
/// POST /auth/signup
///
/// # Errors
///
/// Returns 400 for validation failures and duplicate emails.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AccountResponse>), AppError> {
    let auth = AuthService::new(state.pool());

    let account = auth
        .signup(&request.name, &request.email, &request.password)
        .await?;

    let pair = state.sessions().login(account.id).await?;
    let jar = set_session_cookies(jar, &pair, &state);

    info!(account_id = %account.id, "account created");
    set_sentry_user(&account.id, Some(account.email.as_ref()));

    Ok((StatusCode::CREATED, jar, Json(account.into())))
}

/// Login with email and password.
///
/// POST /auth/login
///
/// # Errors
///
/// Returns 400 for bad credentials.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AccountResponse>), AppError> {
    let auth = AuthService::new(state.pool());

    let account = auth.login(&request.email, &request.password).await?;

    let pair = state.sessions().login(account.id).await?;
    let jar = set_session_cookies(jar, &pair, &state);

    info!(account_id = %account.id, "login");
    set_sentry_user(&account.id, Some(account.email.as_ref()));

    Ok((jar, Json(account.into())))
}

/// Revoke the session identified by the refresh token cookie.
///
/// POST /auth/logout
///
/// # Errors
///
/// Returns 400 when no refresh token cookie is present.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let presented = refresh_cookie(&jar)?;

    state.sessions().logout(&presented).await?;
    clear_sentry_user();

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    Ok((jar, Json(json!({ "message": "Logged out successfully" }))))
}

/// Exchange the refresh token cookie for a new access token cookie.
///
/// POST /auth/refresh
///
/// The refresh cookie is left untouched; only the access cookie is replaced.
///
/// # Errors
///
/// Returns 400 when the cookie is missing, invalid, expired, or revoked.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let presented = refresh_cookie(&jar)?;

    let access = state.sessions().refresh(&presented).await?;
    let jar = jar.add(token_cookie(ACCESS_TOKEN_COOKIE, &access, &state));

    Ok((jar, Json(json!({ "message": "Token refreshed successfully" }))))
}

/// Pull the refresh token out of the cookie jar.
fn refresh_cookie(jar: &CookieJar) -> Result<String, AppError> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(AppError::Session(SessionError::MissingRefreshToken))
}

/// Attach both session cookies to the jar.
fn set_session_cookies(jar: CookieJar, pair: &TokenPair, state: &AppState) -> CookieJar {
    jar.add(token_cookie(ACCESS_TOKEN_COOKIE, &pair.access, state))
        .add(token_cookie(REFRESH_TOKEN_COOKIE, &pair.refresh, state))
}

/// Build a session cookie: `HttpOnly`, `SameSite=Strict`, `Secure` outside
/// local development, max-age matching the token's own expiry.
fn token_cookie(name: &'static str, token: &SignedToken, state: &AppState) -> Cookie<'static> {
    let max_age = time::Duration::seconds(
        (token.expires_at - chrono::Utc::now())
            .num_seconds()
            .max(0),
    );

    Cookie::build((name, token.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config().secure_cookies())
        .max_age(max_age)
        .build()
}

/// Expired cookie used to clear a session cookie on logout. Attributes must
/// match the ones the cookie was set with for browsers to drop it.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}
