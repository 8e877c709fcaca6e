//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                - Liveness check
//! GET  /health/ready          - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/signup           - Register and start a session (201)
//! POST /auth/login            - Login, set access+refresh cookies
//! POST /auth/logout           - Revoke the session, clear cookies
//! POST /auth/refresh          - Exchange refresh cookie for a new access cookie
//!
//! # Cart (requires access token)
//! GET    /cart                - Cart contents with product details
//! POST   /cart                - Add one unit of a product
//! PATCH  /cart/{product_id}   - Set a line's quantity (0 removes)
//! DELETE /cart                - Remove one product, or clear the cart
//! ```

pub mod auth;
pub mod cart;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::list).post(cart::add).delete(cart::remove))
        .route("/{product_id}", patch(cart::set_quantity))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
}
