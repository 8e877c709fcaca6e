//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Rate limiting (governor)

pub mod auth;
pub mod rate_limit;

pub use auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, RequireAuth};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
