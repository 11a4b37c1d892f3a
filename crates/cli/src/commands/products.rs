//! Product catalog commands.

use std::collections::HashMap;

use clap::Args;
use tracing::info;

use commerce_core::{FileKey, ProductId, Slug, StoreId};
use commerce_market::actions::{UpdateProduct, update_product};
use commerce_market::db::ProductRepository;
use commerce_market::models::{ProductInput, ProductListParams, ProductWithStore};
use commerce_market::UploadThingClient;

/// Listing options, spelled like the storefront query string.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// `<name|price|createdAt|stock>.<asc|desc>`
    #[arg(long)]
    sort: Option<String>,
    /// Minimum price
    #[arg(long)]
    pmin: Option<String>,
    /// Maximum price
    #[arg(long)]
    pmax: Option<String>,
    /// Dot-separated store slugs
    #[arg(long)]
    sellers: Option<String>,
    /// Dot-separated categories
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    page_size: Option<String>,
}

impl ListArgs {
    fn into_params(self) -> ProductListParams {
        let query: HashMap<String, String> = [
            ("sort", self.sort),
            ("pmin", self.pmin),
            ("pmax", self.pmax),
            ("sellers", self.sellers),
            ("category", self.category),
            ("page", self.page),
            ("page_size", self.page_size),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect();

        ProductListParams::from_query(&query)
    }
}

/// Product edit options. Omitted fields keep their current value.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Product ID
    id: i32,
    /// Store the product belongs to
    #[arg(long)]
    store_id: Option<i32>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    stock: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    rating: Option<i32>,
    /// Key of an image to remove (repeatable)
    #[arg(long = "delete-image")]
    delete_images: Vec<String>,
}

/// List one page of the catalog.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let params = args.into_params();
    let (_, pool) = super::connect().await?;

    let page = ProductRepository::new(&pool).page(&params).await?;

    info!(
        "Page {} of {} ({} products)",
        page.page, page.page_count, page.total
    );
    for item in &page.items {
        log_product(item);
    }

    Ok(())
}

/// Show one product with its store.
///
/// # Errors
///
/// Returns an error if the product does not exist or the query fails.
pub async fn show(slug: &str) -> Result<(), Box<dyn std::error::Error>> {
    let slug = lookup_slug(slug)?;
    let (_, pool) = super::connect().await?;

    let item = ProductRepository::new(&pool)
        .get_by_slug_with_store(&slug)
        .await?
        .ok_or_else(|| not_found(slug.as_str()))?;

    log_product(&item);
    let product = &item.product;
    if let Some(description) = &product.description {
        info!("  {description}");
    }
    info!(
        "  stock={} rating={} sku={}",
        product.stock,
        product.rating.value(),
        product.stock_keeping_unit.as_deref().unwrap_or("-")
    );
    for image in &product.images {
        info!("  image {} {} ({})", image.key, image.name, image.url);
    }

    Ok(())
}

/// Edit a product, deleting removed images at the upload provider.
///
/// # Errors
///
/// Returns an error if the product does not exist, the edit is rejected, or
/// image deletion fails.
pub async fn update(args: UpdateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = super::connect().await?;

    let id = ProductId::new(args.id);
    let current = ProductRepository::new(&pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| format!("No product with id {id}"))?;

    let images_to_delete = args
        .delete_images
        .iter()
        .map(|key| FileKey::parse(key))
        .collect::<Result<Vec<_>, _>>()?;

    let input = ProductInput {
        name: args.name.unwrap_or_else(|| current.name.clone()),
        category: args.category.or_else(|| current.category.clone()),
        description: args.description.or_else(|| current.description.clone()),
        images: current
            .images
            .iter()
            .filter(|image| !images_to_delete.contains(&image.key))
            .cloned()
            .collect(),
        price: Some(args.price.unwrap_or_else(|| current.price.to_string())),
        stock: Some(args.stock.unwrap_or_else(|| current.stock.to_string())),
        rating: Some(args.rating.unwrap_or_else(|| current.rating.value())),
    };

    let storage = config
        .uploads
        .as_ref()
        .map(UploadThingClient::new)
        .transpose()?;

    let request = UpdateProduct {
        id,
        store_id: args.store_id.map(StoreId::new).or(current.store_id),
        input,
        images_to_delete,
    };

    match update_product(&pool, &storage, request).await {
        Ok(product) => {
            info!("Updated product #{} ({})", product.id, product.slug);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Product update failed");
            Err(e.user_message().into())
        }
    }
}

fn log_product(item: &ProductWithStore) {
    let product = &item.product;
    let store = item
        .store
        .as_ref()
        .map_or("no store", |store| store.name.as_str());
    info!(
        "  #{} {} ({}) {} [{}] {}",
        product.id,
        product.name,
        product.slug,
        product.price.format_money(),
        product.category.as_deref().unwrap_or("-"),
        store,
    );
}

/// Stored slugs are canonical, so one that fails to parse matches nothing.
fn lookup_slug(raw: &str) -> Result<Slug, String> {
    Slug::parse(raw).map_err(|_| not_found(raw))
}

fn not_found(slug: &str) -> String {
    format!("No product with slug {slug}")
}
