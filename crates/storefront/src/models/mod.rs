//! Domain models for storefront.

pub mod account;
pub mod product;

pub use account::{Account, CartLine};
pub use product::Product;
