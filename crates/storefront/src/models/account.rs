//! Account domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mango_stand_core::{AccountId, Email, ProductId, Role};

/// A storefront account (domain type).
///
/// The password hash is deliberately not part of this type; it only
/// travels through `AccountRepository::find_by_email_with_password`.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Account email address (unique).
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Current cart contents.
    pub cart: Vec<CartLine>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One line in an account's cart.
///
/// At most one line exists per product; a line never carries quantity 0
/// (setting quantity to 0 removes it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line refers to (not owned by the account).
    pub product: ProductId,
    /// Quantity, always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub const fn new(product: ProductId, quantity: u32) -> Self {
        Self { product, quantity }
    }
}
