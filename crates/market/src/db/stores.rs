//! Store repository.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;

use commerce_core::{Slug, StoreId};

use super::RepositoryError;
use crate::models::{NewStore, Store, StoreChanges};

pub(crate) const STORE_COLUMNS: &str = "id, name, slug, description, active, \
     store_owner_name, unique_store_code, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: Slug,
    description: String,
    active: bool,
    store_owner_name: Option<String>,
    unique_store_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            active: row.active,
            store_owner_name: row.store_owner_name,
            unique_store_code: row.unique_store_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    /// Returns `RepositoryError::Constraint` if the owner does not exist.
    #[instrument(skip(self, store), fields(slug = %store.slug()))]
    pub async fn create(&self, store: &NewStore) -> Result<Store, RepositoryError> {
        let sql = format!(
            "INSERT INTO stores (name, slug, description, active, store_owner_name, unique_store_code)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STORE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(store.name())
            .bind(store.slug())
            .bind(store.description())
            .bind(store.active)
            .bind(store.owner_name())
            .bind(store.unique_store_code())
            .fetch_one(self.pool)
            .await?;

        tracing::info!(store_id = %row.id, "Store created");
        Ok(row.into())
    }

    /// Get a store by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a store by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// List all stores ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM stores ORDER BY name ASC, id ASC");
        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether a store with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: StoreId) -> Result<bool, RepositoryError> {
        Self::exists_with(self.pool, id).await
    }

    /// [`StoreRepository::exists`] on an arbitrary executor, e.g. an open
    /// transaction. Takes a share lock so the store cannot be deleted
    /// before the transaction ends.
    pub(crate) async fn exists_with<'e, E>(executor: E, id: StoreId) -> Result<bool, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM stores WHERE id = $1 FOR KEY SHARE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(found.is_some())
    }

    /// Rename a store, optionally replacing its description. The slug follows
    /// the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    /// Returns `RepositoryError::Conflict` if the new name or slug is taken.
    #[instrument(skip(self, changes), fields(store_id = %id))]
    pub async fn update(
        &self,
        id: StoreId,
        changes: &StoreChanges,
    ) -> Result<Store, RepositoryError> {
        // Keep the owner code in step with the name
        let sql = format!(
            "UPDATE stores
             SET name = $2,
                 slug = $3,
                 description = COALESCE($4, description),
                 unique_store_code = CASE
                     WHEN store_owner_name IS NULL THEN NULL
                     ELSE store_owner_name || ':' || $2
                 END
             WHERE id = $1
             RETURNING {STORE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .bind(changes.name())
            .bind(changes.slug())
            .bind(changes.description())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Open or close a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn set_active(&self, id: StoreId, active: bool) -> Result<Store, RepositoryError> {
        let sql = format!("UPDATE stores SET active = $2 WHERE id = $1 RETURNING {STORE_COLUMNS}");
        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a store. Its products stay in the catalog without a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn delete(&self, id: StoreId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
