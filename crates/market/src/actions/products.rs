//! Seller-facing product mutations.

use sqlx::PgPool;
use tracing::instrument;

use commerce_core::{FileKey, ProductId, StoreId};

use super::ActionError;
use crate::db::{ProductRepository, RepositoryError, StoreRepository};
use crate::models::{Product, ProductChanges, ProductInput, ValidationError};
use crate::uploads::FileStorage;

/// A seller's product edit.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub id: ProductId,
    /// Store the product belongs to after the edit.
    pub store_id: Option<StoreId>,
    pub input: ProductInput,
    /// Uploaded files the seller removed from the product.
    pub images_to_delete: Vec<FileKey>,
}

/// Apply a seller's product edit.
///
/// Runs in one transaction:
///
/// 1. the store must exist (it is share-locked until commit)
/// 2. the product row is overwritten with the sanitized input and a slug
///    recomputed from the new name
/// 3. removed images are deleted at the upload provider
///
/// If the provider call fails the row update is rolled back. If the commit
/// itself fails after the provider call, the product keeps referencing
/// deleted files.
///
/// # Errors
///
/// Returns `ActionError::Validation` if the store is missing or the input is
/// unusable, `ActionError::Repository` with `NotFound` if the product does not
/// exist or `Conflict` if the new name or slug is taken, and
/// `ActionError::Upload` if image deletion fails.
#[instrument(skip(pool, storage, request), fields(product_id = %request.id))]
pub async fn update_product<S: FileStorage>(
    pool: &PgPool,
    storage: &S,
    request: UpdateProduct,
) -> Result<Product, ActionError> {
    let store_id = request.store_id.ok_or(ValidationError::InvalidStore)?;
    let changes = ProductChanges::from_input(&request.input)?;

    let mut tx = pool.begin().await?;

    if !StoreRepository::exists_with(&mut *tx, store_id).await? {
        tracing::warn!(store_id = %store_id, "Product update rejected: unknown store");
        return Err(ValidationError::InvalidStore.into());
    }

    let product = ProductRepository::update_with(&mut *tx, request.id, store_id, &changes)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    if !request.images_to_delete.is_empty() {
        storage.delete_files(&request.images_to_delete).await?;
    }

    tx.commit().await?;

    tracing::info!(
        slug = %product.slug,
        images_deleted = request.images_to_delete.len(),
        "Product updated"
    );
    Ok(product)
}
