//! Product domain type.
//!
//! The catalog itself (creation, featuring, image hosting) is managed
//! elsewhere; this service only reads products to resolve cart lines.

use serde::Serialize;

use mango_stand_core::{Price, ProductId};

/// A catalog product, as read through the catalog interface.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Hosted image URL.
    pub image: String,
    /// Category handle.
    pub category: String,
}
