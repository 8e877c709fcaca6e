//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and password login
//! - `tokens` - Access/refresh token issuance and verification
//! - `session` - Session lifecycle (token pairs + revocation store)
//! - `cart` - Cart document mutations and listing

pub mod auth;
pub mod cart;
pub mod session;
pub mod tokens;
