//! Seed the database with users, stores and products from a YAML catalog.
//!
//! Seeding is idempotent: rows whose unique name already exists are skipped,
//! so the same file can be loaded repeatedly.
//!
//! # File Format
//!
//! ```yaml
//! users:
//!   - username: hendry
//!     full_name: Hendry W
//!     email: hendry@example.com
//!     password_hash: "$argon2id$..."
//! stores:
//!   - name: Acme
//!     description: Hand tools
//!     owner: hendry
//!     active: true
//!     products:
//!       - name: Widget
//!         price: "19.99"
//!         stock: "5"
//!         category: tools
//! ```

use std::path::Path;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{error, info, warn};

use commerce_core::{Email, ImageData, Price, Rating, Stock};
use commerce_market::db::{ProductRepository, RepositoryError, StoreRepository, UserRepository};
use commerce_market::models::{NewProduct, NewStore, NewUser};

/// Top-level catalog file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub images: Vec<ImageData>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Check a catalog before touching the database. Returns every problem found.
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> Vec<String> {
    let mut errors = Vec::new();

    for user in &catalog.users {
        if let Err(e) = build_user(user) {
            errors.push(format!("user {}: {e}", user.username));
        }
    }

    for store in &catalog.stores {
        if let Err(e) = build_store(store) {
            errors.push(format!("store {}: {e}", store.name));
        }
        let known_owner = store
            .owner
            .as_deref()
            .is_none_or(|owner| catalog.users.iter().any(|u| u.username.trim() == owner.trim()));
        if !known_owner {
            warn!(store = %store.name, "Owner not defined in this catalog");
        }
        for product in &store.products {
            if let Err(e) = build_product(product) {
                errors.push(format!("product {}: {e}", product.name));
            }
        }
    }

    errors
}

fn build_user(user: &SeedUser) -> Result<NewUser, Box<dyn std::error::Error>> {
    let email = Email::parse(&user.email)?;
    Ok(NewUser::new(
        &user.username,
        &user.full_name,
        email,
        SecretString::from(user.password_hash.clone()),
    )?)
}

fn build_store(store: &SeedStore) -> Result<NewStore, Box<dyn std::error::Error>> {
    let mut new_store = NewStore::new(&store.name, &store.description)?;
    if let Some(owner) = &store.owner {
        new_store = new_store.with_owner(owner)?;
    }
    new_store.active = store.active;
    Ok(new_store)
}

fn build_product(product: &SeedProduct) -> Result<NewProduct, Box<dyn std::error::Error>> {
    let mut new_product = NewProduct::new(&product.name)?;
    new_product.description.clone_from(&product.description);
    new_product.price = product
        .price
        .as_deref()
        .map(Price::parse)
        .transpose()?
        .unwrap_or(Price::ZERO);
    new_product.stock = product
        .stock
        .as_deref()
        .map(Stock::parse)
        .transpose()?
        .unwrap_or_default();
    new_product.category.clone_from(&product.category);
    new_product.stock_keeping_unit.clone_from(&product.sku);
    new_product.rating = Rating::sanitize(product.rating);
    new_product.images.clone_from(&product.images);
    new_product.validate()?;
    Ok(new_product)
}

/// Seed users, stores and products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails for a reason other than a duplicate.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: Catalog = serde_yaml::from_str(&content)?;

    info!(
        users = catalog.users.len(),
        stores = catalog.stores.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let (_, pool) = super::connect().await?;
    let users = UserRepository::new(&pool);
    let stores = StoreRepository::new(&pool);
    let products = ProductRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for user in &catalog.users {
        let new_user = build_user(user)?;
        record(&mut summary, users.create(&new_user).await.map(|_| ()))?;
    }

    for store in &catalog.stores {
        let new_store = build_store(store)?;
        let store_id = match stores.create(&new_store).await {
            Ok(created) => {
                summary.inserted += 1;
                created.id
            }
            Err(RepositoryError::Conflict(_)) => {
                summary.skipped += 1;
                stores
                    .get_by_slug(new_store.slug())
                    .await?
                    .ok_or_else(|| format!("store {} conflicts with another store", store.name))?
                    .id
            }
            Err(e) => return Err(e.into()),
        };

        for product in &store.products {
            let mut new_product = build_product(product)?;
            new_product.store_id = Some(store_id);
            record(&mut summary, products.create(&new_product).await.map(|_| ()))?;
        }
    }

    info!("Seeding complete!");
    info!("  Rows inserted: {}", summary.inserted);
    info!("  Rows skipped (already exist): {}", summary.skipped);

    Ok(())
}

fn record(summary: &mut SeedSummary, result: Result<(), RepositoryError>) -> Result<(), RepositoryError> {
    match result {
        Ok(()) => summary.inserted += 1,
        Err(RepositoryError::Conflict(_)) => summary.skipped += 1,
        Err(e) => return Err(e),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
users:
  - username: hendry
    full_name: Hendry W
    email: hendry@example.com
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
stores:
  - name: Acme
    description: Hand tools
    owner: hendry
    active: true
    products:
      - name: Widget
        price: "19.99"
        stock: "5"
        category: tools
      - name: Gadget
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog: Catalog = serde_yaml::from_str(CATALOG).unwrap();
        assert_eq!(catalog.users.len(), 1);
        assert_eq!(catalog.stores[0].products.len(), 2);
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_build_product_defaults() {
        let catalog: Catalog = serde_yaml::from_str(CATALOG).unwrap();
        let gadget = build_product(&catalog.stores[0].products[1]).unwrap();
        assert_eq!(gadget.price, Price::ZERO);
        assert_eq!(gadget.stock.units(), 1);

        let widget = build_product(&catalog.stores[0].products[0]).unwrap();
        assert_eq!(widget.price.format_money(), "19.99");
        assert_eq!(widget.slug().as_str(), "widget");
    }

    #[test]
    fn test_validation_collects_errors() {
        let catalog: Catalog = serde_yaml::from_str(
            r#"
users:
  - username: "bad name"
    full_name: X
    email: not-an-email
    password_hash: x
stores:
  - name: "!!!"
    products:
      - name: Widget
        price: "-1"
"#,
        )
        .unwrap();
        assert_eq!(validate_catalog(&catalog).len(), 3);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_yaml::from_str::<Catalog>("shops: []").is_err());
    }

    #[test]
    fn test_record_counts_conflicts() {
        let mut summary = SeedSummary::default();
        record(&mut summary, Ok(())).unwrap();
        record(&mut summary, Err(RepositoryError::Conflict("dup".into()))).unwrap();
        assert!(record(&mut summary, Err(RepositoryError::NotFound)).is_err());
        assert_eq!(summary, SeedSummary { inserted: 1, skipped: 1 });
    }
}
