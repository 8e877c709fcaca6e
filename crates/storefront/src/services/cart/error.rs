//! Cart error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the cart.
    #[error("product not found in cart")]
    NotInCart,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
