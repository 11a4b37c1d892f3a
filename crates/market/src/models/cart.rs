//! Shopping cart domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use commerce_core::{CartId, CartItem, ProductId};

use super::ValidationError;

/// A shopping cart (domain type).
///
/// Once `closed` is set the cart is frozen; the repository rejects further
/// edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    /// Line items, one per product.
    pub items: Vec<CartItem>,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Quantity of one product, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.product_id == product_id)
            .map_or(0, |item| item.quantity)
    }
}

/// Add `quantity` units of a product, merging into an existing line.
pub(crate) fn add_line(
    items: &mut Vec<CartItem>,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), ValidationError> {
    if quantity == 0 {
        return Err(ValidationError::ZeroQuantity);
    }
    match items.iter_mut().find(|item| item.product_id == product_id) {
        Some(item) => {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or(ValidationError::QuantityOverflow)?;
        }
        None => items.push(CartItem {
            product_id,
            quantity,
        }),
    }
    Ok(())
}

/// Set the quantity of a product's line. Zero removes the line.
pub(crate) fn set_line(items: &mut Vec<CartItem>, product_id: ProductId, quantity: u32) {
    if quantity == 0 {
        remove_line(items, product_id);
        return;
    }
    match items.iter_mut().find(|item| item.product_id == product_id) {
        Some(item) => item.quantity = quantity,
        None => items.push(CartItem {
            product_id,
            quantity,
        }),
    }
}

/// Remove a product's line. Returns whether a line was removed.
pub(crate) fn remove_line(items: &mut Vec<CartItem>, product_id: ProductId) -> bool {
    let before = items.len();
    items.retain(|item| item.product_id != product_id);
    items.len() != before
}
