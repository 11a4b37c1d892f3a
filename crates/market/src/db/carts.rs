//! Shopping cart repository.
//!
//! Every edit locks the cart row, checks that the cart is still open,
//! rewrites the item list and commits. A closed cart is never modified.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use commerce_core::{CartId, CartItem, Document, ProductId};

use super::RepositoryError;
use crate::models::Cart;
use crate::models::cart::{add_line, remove_line, set_line};

const CART_COLUMNS: &str = "id, items, closed, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    items: Json<Vec<CartItem>>,
    closed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let items = row.items.0;
        items.validate().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid items on cart {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            items,
            closed: row.closed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shopping cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an empty, open cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self))]
    pub async fn create(&self) -> Result<Cart, RepositoryError> {
        let sql = format!("INSERT INTO carts DEFAULT VALUES RETURNING {CART_COLUMNS}");
        let row = sqlx::query_as::<_, CartRow>(&sql)
            .fetch_one(self.pool)
            .await?;

        tracing::info!(cart_id = %row.id, "Cart created");
        row.try_into()
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored items are invalid.
    pub async fn get(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1");
        let row = sqlx::query_as::<_, CartRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Add units of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist,
    /// `RepositoryError::Immutable` if it is closed, and
    /// `RepositoryError::Constraint` if the product does not exist or the
    /// quantity is invalid.
    #[instrument(skip(self), fields(cart_id = %id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut items = lock_open_cart(&mut tx, id).await?;

        let product_exists =
            sqlx::query_scalar::<_, i32>("SELECT id FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
        if !product_exists {
            return Err(RepositoryError::Constraint(
                "product does not exist".to_owned(),
            ));
        }

        add_line(&mut items, product_id, quantity)
            .map_err(|e| RepositoryError::Constraint(e.to_string()))?;
        save_items(tx, id, &items).await
    }

    /// Set the quantity of a product already in the cart. Zero removes the
    /// line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or line does not
    /// exist and `RepositoryError::Immutable` if the cart is closed.
    #[instrument(skip(self), fields(cart_id = %id, product_id = %product_id))]
    pub async fn set_item_quantity(
        &self,
        id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut items = lock_open_cart(&mut tx, id).await?;

        if !items.iter().any(|item| item.product_id == product_id) {
            return Err(RepositoryError::NotFound);
        }
        set_line(&mut items, product_id, quantity);
        save_items(tx, id, &items).await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart or line does not
    /// exist and `RepositoryError::Immutable` if the cart is closed.
    #[instrument(skip(self), fields(cart_id = %id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        id: CartId,
        product_id: ProductId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut items = lock_open_cart(&mut tx, id).await?;

        if !remove_line(&mut items, product_id) {
            return Err(RepositoryError::NotFound);
        }
        save_items(tx, id, &items).await
    }

    /// Close a cart. Closing an already closed cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart does not exist.
    #[instrument(skip(self), fields(cart_id = %id))]
    pub async fn close(&self, id: CartId) -> Result<Cart, RepositoryError> {
        let sql = format!(
            "UPDATE carts SET closed = TRUE
             WHERE id = $1 AND NOT closed
             RETURNING {CART_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CartRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => {
                tracing::info!("Cart closed");
                row.try_into()
            }
            None => self.get(id).await?.ok_or(RepositoryError::NotFound),
        }
    }
}

/// Lock a cart row for the rest of the transaction and return its items.
async fn lock_open_cart(
    tx: &mut Transaction<'_, Postgres>,
    id: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE id = $1 FOR UPDATE");
    let cart: Cart = sqlx::query_as::<_, CartRow>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

    if cart.closed {
        return Err(RepositoryError::Immutable(format!("cart {id} is closed")));
    }
    Ok(cart.items)
}

async fn save_items(
    mut tx: Transaction<'_, Postgres>,
    id: CartId,
    items: &[CartItem],
) -> Result<Cart, RepositoryError> {
    let sql = format!("UPDATE carts SET items = $2 WHERE id = $1 RETURNING {CART_COLUMNS}");
    let cart: Cart = sqlx::query_as::<_, CartRow>(&sql)
        .bind(id)
        .bind(Json(items))
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

    tx.commit().await?;
    Ok(cart)
}
