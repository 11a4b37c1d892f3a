//! Product repository: catalog writes, product pages and paginated listings.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;

use commerce_core::{
    Document, ImageData, Price, ProductId, Rating, Slug, Stock, StoreId,
};

use super::RepositoryError;
use crate::models::{
    NewProduct, Product, ProductChanges, ProductListParams, ProductPage, ProductWithStore, Store,
};

const PRODUCT_COLUMNS: &str = "p.id, p.store_id, p.name, p.slug, p.description, p.price, \
     p.stock, p.category, p.stock_keeping_unit, p.rating, p.images, p.created_at, p.updated_at";

const JOINED_STORE_COLUMNS: &str = "s.id AS s_id, s.name AS s_name, s.slug AS s_slug, \
     s.description AS s_description, s.active AS s_active, \
     s.store_owner_name AS s_store_owner_name, s.unique_store_code AS s_unique_store_code, \
     s.created_at AS s_created_at, s.updated_at AS s_updated_at";

/// Shared by the listing and its count so both see the same rows.
///
/// `$1`/`$2` price bounds, `$3` store slugs, `$4` categories.
const LISTING_FILTER: &str = "p.price BETWEEN $1 AND $2 \
     AND ($3::text[] IS NULL OR s.slug = ANY($3)) \
     AND ($4::text[] IS NULL OR p.category = ANY($4))";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    store_id: Option<StoreId>,
    name: String,
    slug: Slug,
    description: Option<String>,
    price: Price,
    stock: Stock,
    category: Option<String>,
    stock_keeping_unit: Option<String>,
    rating: Rating,
    images: Json<Vec<ImageData>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let images = row.images.0;
        images.validate().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid images on product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category: row.category,
            stock_keeping_unit: row.stock_keeping_unit,
            rating: row.rating,
            images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A product joined with its (possibly missing) store.
#[derive(Debug, sqlx::FromRow)]
struct ProductWithStoreRow {
    #[sqlx(flatten)]
    product: ProductRow,
    s_id: Option<StoreId>,
    s_name: Option<String>,
    s_slug: Option<Slug>,
    s_description: Option<String>,
    s_active: Option<bool>,
    s_store_owner_name: Option<String>,
    s_unique_store_code: Option<String>,
    s_created_at: Option<DateTime<Utc>>,
    s_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductWithStoreRow> for ProductWithStore {
    type Error = RepositoryError;

    fn try_from(row: ProductWithStoreRow) -> Result<Self, Self::Error> {
        let store = match row.s_id {
            None => None,
            Some(id) => {
                let missing =
                    || RepositoryError::DataCorruption(format!("incomplete store row {id}"));
                Some(Store {
                    id,
                    name: row.s_name.ok_or_else(missing)?,
                    slug: row.s_slug.ok_or_else(missing)?,
                    description: row.s_description.ok_or_else(missing)?,
                    active: row.s_active.ok_or_else(missing)?,
                    store_owner_name: row.s_store_owner_name,
                    unique_store_code: row.s_unique_store_code,
                    created_at: row.s_created_at.ok_or_else(missing)?,
                    updated_at: row.s_updated_at.ok_or_else(missing)?,
                })
            }
        };

        Ok(Self {
            product: row.product.try_into()?,
            store,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or slug is taken.
    /// Returns `RepositoryError::Constraint` if the store does not exist or a
    /// field is invalid.
    #[instrument(skip(self, product), fields(slug = %product.slug()))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        product
            .validate()
            .map_err(|e| RepositoryError::Constraint(e.to_string()))?;

        let sql = format!(
            "INSERT INTO products AS p (store_id, name, slug, description, price, stock,
                                        category, stock_keeping_unit, rating, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(product.store_id)
            .bind(product.name())
            .bind(product.slug())
            .bind(product.description.as_deref())
            .bind(product.price)
            .bind(product.stock)
            .bind(product.category.as_deref())
            .bind(product.stock_keeping_unit.as_deref())
            .bind(product.rating)
            .bind(Json(&product.images))
            .fetch_one(self.pool)
            .await?;

        tracing::info!(product_id = %row.id, "Product created");
        row.try_into()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored images are invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a product and its store by product slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_slug_with_store(
        &self,
        slug: &Slug,
    ) -> Result<Option<ProductWithStore>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, {JOINED_STORE_COLUMNS}
             FROM products p
             LEFT JOIN stores s ON s.id = p.store_id
             WHERE p.slug = $1"
        );
        let row = sqlx::query_as::<_, ProductWithStoreRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List products of one store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             WHERE p.store_id = $1
             ORDER BY p.created_at DESC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// One page of the catalog, filtered and ordered per `params`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_page(
        &self,
        params: &ProductListParams,
    ) -> Result<Vec<ProductWithStore>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}, {JOINED_STORE_COLUMNS}
             FROM products p
             LEFT JOIN stores s ON s.id = p.store_id
             WHERE {LISTING_FILTER}
             ORDER BY {order_by}
             LIMIT $5 OFFSET $6",
            order_by = params.sort.order_by_sql(),
        );
        let rows = sqlx::query_as::<_, ProductWithStoreRow>(&sql)
            .bind(params.min_price)
            .bind(params.max_price)
            .bind(params.sellers.as_deref())
            .bind(params.categories.as_deref())
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of products matching the filters of `params` (pagination ignored).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, params: &ProductListParams) -> Result<u64, RepositoryError> {
        let sql = format!(
            "SELECT COUNT(*)
             FROM products p
             LEFT JOIN stores s ON s.id = p.store_id
             WHERE {LISTING_FILTER}"
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(params.min_price)
            .bind(params.max_price)
            .bind(params.sellers.as_deref())
            .bind(params.categories.as_deref())
            .fetch_one(self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count {count}")))
    }

    /// Number of pages the filtered catalog spans at `params.page_size`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page_count(&self, params: &ProductListParams) -> Result<u64, RepositoryError> {
        let total = self.count(params).await?;
        Ok(params.page_count(total))
    }

    /// A page of products together with the total and page count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn page(&self, params: &ProductListParams) -> Result<ProductPage, RepositoryError> {
        let items = self.list_page(params).await?;
        let total = self.count(params).await?;
        Ok(ProductPage {
            items,
            total,
            page: params.page,
            page_count: params.page_count(total),
        })
    }

    /// Overwrite the editable fields of a product and move it to `store_id`.
    ///
    /// Returns `None` if no product has this ID.
    pub(crate) async fn update_with<'e, E>(
        executor: E,
        id: ProductId,
        store_id: StoreId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "UPDATE products AS p
             SET store_id = $2,
                 name = $3,
                 slug = $4,
                 category = $5,
                 description = $6,
                 images = $7,
                 price = $8,
                 stock = $9,
                 rating = $10
             WHERE p.id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(store_id)
            .bind(&changes.name)
            .bind(&changes.slug)
            .bind(changes.category.as_deref())
            .bind(changes.description.as_deref())
            .bind(Json(&changes.images))
            .bind(changes.price)
            .bind(changes.stock)
            .bind(changes.rating)
            .fetch_optional(executor)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
