//! Cart service.
//!
//! Cart mutations are expressed as pure functions over a list of lines,
//! with the service providing the read-modify-write cycle against the
//! account's stored cart document. Each mutation replaces the whole
//! document; concurrent mutations on the same account are last-write-wins.

mod error;

pub use error::CartError;

use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;

use mango_stand_core::{AccountId, ProductId};

use crate::db::accounts::AccountRepository;
use crate::db::products::ProductCatalog;
use crate::models::account::CartLine;
use crate::models::product::Product;

/// A cart line joined with its catalog product, as returned by `list`.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// The resolved catalog product.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity of this product in the cart.
    pub quantity: u32,
}

/// Cart service.
///
/// Reads and mutates the cart document of a single account.
pub struct CartService<'a> {
    accounts: AccountRepository<'a>,
    catalog: ProductCatalog<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
            catalog: ProductCatalog::new(pool),
        }
    }

    /// List the cart with product details.
    ///
    /// Lines whose product no longer exists in the catalog are silently
    /// dropped from the response; the stored document is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn list(&self, account: AccountId) -> Result<Vec<CartItem>, CartError> {
        let lines = self.accounts.cart(account).await?;
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = lines.iter().map(|line| line.product).collect();
        let products = self.catalog.get_by_ids(&ids).await?;

        Ok(join_lines(lines, &products))
    }

    /// Add one unit of a product to the cart.
    ///
    /// An existing line for the product is incremented; otherwise a new
    /// line with quantity 1 is appended. The product ID is not checked
    /// against the catalog here; stale lines fall out at `list` time.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn add(&self, account: AccountId, product: ProductId) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.accounts.cart(account).await?;
        add_line(&mut lines, product);
        self.accounts.update_cart(account, &lines).await?;

        debug!(%account, %product, "added product to cart");
        Ok(lines)
    }

    /// Set the quantity of an existing cart line.
    ///
    /// Quantity 0 removes the line. A product with no line in the cart
    /// yields `CartError::NotInCart` regardless of the quantity asked for.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product has no line, and
    /// `CartError::Repository` if the database operation fails.
    pub async fn set_quantity(
        &self,
        account: AccountId,
        product: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.accounts.cart(account).await?;
        if !set_line_quantity(&mut lines, product, quantity) {
            return Err(CartError::NotInCart);
        }
        self.accounts.update_cart(account, &lines).await?;

        debug!(%account, %product, quantity, "set cart line quantity");
        Ok(lines)
    }

    /// Remove one product's line, or clear the whole cart.
    ///
    /// With `Some(product)`, any line for that product is removed; with
    /// `None`, the cart is emptied. Both forms succeed even when there is
    /// nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the database operation fails.
    pub async fn remove(
        &self,
        account: AccountId,
        product: Option<ProductId>,
    ) -> Result<Vec<CartLine>, CartError> {
        let mut lines = self.accounts.cart(account).await?;
        remove_line(&mut lines, product);
        self.accounts.update_cart(account, &lines).await?;

        debug!(%account, "removed from cart");
        Ok(lines)
    }
}

/// Join cart lines against their resolved products. Lines with no matching
/// product (removed from the catalog since they were added) are dropped.
fn join_lines(lines: Vec<CartLine>, products: &[Product]) -> Vec<CartItem> {
    lines
        .into_iter()
        .filter_map(|line| {
            products
                .iter()
                .find(|p| p.id == line.product)
                .map(|p| CartItem {
                    product: p.clone(),
                    quantity: line.quantity,
                })
        })
        .collect()
}

/// Increment the product's line, or append a quantity-1 line at the end.
/// A line already at `u32::MAX` stays there; it never wraps to 0.
fn add_line(lines: &mut Vec<CartLine>, product: ProductId) {
    if let Some(line) = lines.iter_mut().find(|line| line.product == product) {
        line.quantity = line.quantity.saturating_add(1);
    } else {
        lines.push(CartLine::new(product, 1));
    }
}

/// Set the product's line to `quantity`, removing it when `quantity` is 0.
/// Returns `false` if the product has no line. Relative order of the other
/// lines is preserved.
fn set_line_quantity(lines: &mut Vec<CartLine>, product: ProductId, quantity: u32) -> bool {
    let Some(index) = lines.iter().position(|line| line.product == product) else {
        return false;
    };

    if quantity == 0 {
        lines.remove(index);
    } else if let Some(line) = lines.get_mut(index) {
        line.quantity = quantity;
    }

    true
}

/// Remove the product's line, or clear every line when `product` is `None`.
fn remove_line(lines: &mut Vec<CartLine>, product: Option<ProductId>) {
    match product {
        Some(product) => lines.retain(|line| line.product != product),
        None => lines.clear(),
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    use mango_stand_core::{CurrencyCode, Price};
    use rust_decimal::Decimal;

    fn line(product: i32, quantity: u32) -> CartLine {
        CartLine::new(ProductId::new(product), quantity)
    }

    fn catalog_product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product {id}"),
            description: String::new(),
            price: Price::new(Decimal::new(999, 2), CurrencyCode::USD),
            image: String::new(),
            category: "test".to_owned(),
        }
    }

    #[test]
    fn test_join_lines_drops_stale_products() {
        let lines = vec![line(1, 2), line(2, 1), line(3, 4)];
        // Product 2 is gone from the catalog.
        let products = vec![catalog_product(1), catalog_product(3)];

        let items = join_lines(lines, &products);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product.id, ProductId::new(1));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].product.id, ProductId::new(3));
        assert_eq!(items[1].quantity, 4);
    }

    #[test]
    fn test_add_line_appends_with_quantity_one() {
        let mut lines = vec![line(1, 2)];
        add_line(&mut lines, ProductId::new(9));
        assert_eq!(lines, vec![line(1, 2), line(9, 1)]);
    }

    #[test]
    fn test_add_line_increments_existing() {
        let mut lines = vec![line(1, 2), line(2, 1)];
        add_line(&mut lines, ProductId::new(1));
        assert_eq!(lines, vec![line(1, 3), line(2, 1)]);
    }

    #[test]
    fn test_add_line_saturates_at_max_quantity() {
        let mut lines = vec![line(1, u32::MAX)];
        add_line(&mut lines, ProductId::new(1));
        // Saturates instead of wrapping to a forbidden quantity-0 line.
        assert_eq!(lines, vec![line(1, u32::MAX)]);
    }

    #[test]
    fn test_add_line_keeps_one_line_per_product() {
        let mut lines = Vec::new();
        add_line(&mut lines, ProductId::new(5));
        add_line(&mut lines, ProductId::new(5));
        add_line(&mut lines, ProductId::new(5));
        assert_eq!(lines, vec![line(5, 3)]);
    }

    #[test]
    fn test_set_line_quantity_updates_in_place() {
        let mut lines = vec![line(1, 1), line(2, 4), line(3, 1)];
        assert!(set_line_quantity(&mut lines, ProductId::new(2), 7));
        assert_eq!(lines, vec![line(1, 1), line(2, 7), line(3, 1)]);
    }

    #[test]
    fn test_set_line_quantity_zero_removes_preserving_order() {
        let mut lines = vec![line(1, 1), line(2, 4), line(3, 1)];
        assert!(set_line_quantity(&mut lines, ProductId::new(2), 0));
        assert_eq!(lines, vec![line(1, 1), line(3, 1)]);
    }

    #[test]
    fn test_set_line_quantity_missing_product() {
        let mut lines = vec![line(1, 1)];
        assert!(!set_line_quantity(&mut lines, ProductId::new(2), 3));
        // Quantity 0 for a missing product is still a miss, not a no-op
        // success.
        assert!(!set_line_quantity(&mut lines, ProductId::new(2), 0));
        assert_eq!(lines, vec![line(1, 1)]);
    }

    #[test]
    fn test_remove_line_filters_one_product() {
        let mut lines = vec![line(1, 1), line(2, 4), line(3, 1)];
        remove_line(&mut lines, Some(ProductId::new(2)));
        assert_eq!(lines, vec![line(1, 1), line(3, 1)]);
    }

    #[test]
    fn test_remove_line_absent_product_is_noop() {
        let mut lines = vec![line(1, 1)];
        remove_line(&mut lines, Some(ProductId::new(9)));
        assert_eq!(lines, vec![line(1, 1)]);
    }

    #[test]
    fn test_remove_line_none_clears_cart() {
        let mut lines = vec![line(1, 1), line(2, 4)];
        remove_line(&mut lines, None);
        assert!(lines.is_empty());

        // Clearing an already-empty cart succeeds.
        remove_line(&mut lines, None);
        assert!(lines.is_empty());
    }
}
