//! Cart routes.
//!
//! JSON API endpoints over the caller's own cart. Every handler requires a
//! valid access token; the subject comes from the token, never from the
//! request body.

use axum::{
    Json,
    extract::{Path, State},
};

use mango_stand_core::ProductId;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::account::CartLine;
use crate::services::cart::{CartItem, CartService};
use crate::state::AppState;

/// Request body for adding a product.
#[derive(Debug, serde::Deserialize)]
pub struct AddCartRequest {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
}

/// Request body for setting a line's quantity.
#[derive(Debug, serde::Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Request body for removing a product. The body itself is optional;
/// omitting it (or the field) clears the whole cart.
#[derive(Debug, Default, serde::Deserialize)]
pub struct RemoveCartRequest {
    #[serde(rename = "productId")]
    pub product_id: Option<ProductId>,
}

/// List the cart with product details.
///
/// GET /cart
///
/// # Errors
///
/// Returns 500 if the database operation fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
) -> Result<Json<Vec<CartItem>>, AppError> {
    let cart = CartService::new(state.pool());
    let items = cart.list(account).await?;
    Ok(Json(items))
}

/// Add one unit of a product to the cart.
///
/// POST /cart
///
/// # Errors
///
/// Returns 500 if the database operation fails.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    Json(request): Json<AddCartRequest>,
) -> Result<Json<Vec<CartLine>>, AppError> {
    let cart = CartService::new(state.pool());
    let lines = cart.add(account, request.product_id).await?;
    Ok(Json(lines))
}

/// Set the quantity of an existing cart line. Quantity 0 removes the line.
///
/// PATCH /cart/{product_id}
///
/// # Errors
///
/// Returns 400 for a negative or oversized quantity and 404 when the
/// product has no line in the cart.
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    Path(product_id): Path<ProductId>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<Vec<CartLine>>, AppError> {
    let quantity = u32::try_from(request.quantity)
        .map_err(|_| AppError::BadRequest("Invalid quantity".to_owned()))?;

    let cart = CartService::new(state.pool());
    let lines = cart.set_quantity(account, product_id, quantity).await?;
    Ok(Json(lines))
}

/// Remove one product's line, or clear the whole cart when no product is
/// named. Both forms succeed even when there is nothing to remove.
///
/// DELETE /cart
///
/// # Errors
///
/// Returns 500 if the database operation fails.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(account): RequireAuth,
    request: Option<Json<RemoveCartRequest>>,
) -> Result<Json<Vec<CartLine>>, AppError> {
    let product = request.and_then(|Json(body)| body.product_id);

    let cart = CartService::new(state.pool());
    let lines = cart.remove(account, product).await?;
    Ok(Json(lines))
}
