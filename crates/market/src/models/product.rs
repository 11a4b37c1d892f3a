//! Product domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{
    Document, FileKey, ImageData, Price, ProductId, Rating, Slug, Stock, StoreId,
};

use super::{Store, ValidationError, optional_text, required_text};

/// A product (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Owning store, if it still exists.
    pub store_id: Option<StoreId>,
    /// Display name, unique across products.
    pub name: String,
    /// URL slug derived from `name`.
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Price,
    pub stock: Stock,
    pub category: Option<String>,
    pub stock_keeping_unit: Option<String>,
    pub rating: Rating,
    /// Uploaded images, in display order.
    pub images: Vec<ImageData>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Keys of every uploaded image.
    pub fn image_keys(&self) -> impl Iterator<Item = &FileKey> {
        self.images.iter().map(|image| &image.key)
    }
}

/// A product together with its store, as shown on a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductWithStore {
    pub product: Product,
    /// `None` if the product has no store or the store was deleted.
    pub store: Option<Store>,
}

/// Validated input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    name: String,
    slug: Slug,
    pub store_id: Option<StoreId>,
    pub description: Option<String>,
    pub price: Price,
    pub stock: Stock,
    pub category: Option<String>,
    pub stock_keeping_unit: Option<String>,
    pub rating: Rating,
    pub images: Vec<ImageData>,
}

impl NewProduct {
    /// Validate a product name and start from catalog defaults: price zero,
    /// one unit in stock, no images.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank, too long, or yields
    /// no slug.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = required_text("name", name)?;
        let slug = Slug::from_name(&name)?;
        Ok(Self {
            name,
            slug,
            store_id: None,
            description: None,
            price: Price::ZERO,
            stock: Stock::default(),
            category: None,
            stock_keeping_unit: None,
            rating: Rating::default(),
            images: Vec::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn slug(&self) -> &Slug {
        &self.slug
    }

    /// Check the free-form fields before insert.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a text field is too long or an image is
    /// malformed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        optional_text("category", self.category.as_deref())?;
        optional_text("stock keeping unit", self.stock_keeping_unit.as_deref())?;
        self.images.validate()?;
        Ok(())
    }
}

/// Untrusted product edit as submitted by a seller form.
///
/// Numeric fields are raw strings; they are coerced, never rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageData>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
}

/// Sanitized product edit, ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: String,
    pub slug: Slug,
    pub category: Option<String>,
    pub description: Option<String>,
    pub images: Vec<ImageData>,
    pub price: Price,
    pub stock: Stock,
    pub rating: Rating,
}

impl ProductChanges {
    /// Sanitize a product edit.
    ///
    /// - the slug is recomputed from the trimmed name
    /// - price, stock and rating that are absent, non-numeric or negative
    ///   become zero
    /// - blank category and description become `None`
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is unusable, a text field is too
    /// long, or an image is malformed.
    pub fn from_input(input: &ProductInput) -> Result<Self, ValidationError> {
        let name = required_text("name", &input.name)?;
        let slug = Slug::from_name(&name)?;
        input.images.validate()?;

        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_owned);

        Ok(Self {
            name,
            slug,
            category: optional_text("category", input.category.as_deref())?,
            description,
            images: input.images.clone(),
            price: Price::sanitize(input.price.as_deref()),
            stock: Stock::sanitize(input.stock.as_deref()),
            rating: Rating::sanitize(input.rating),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            ..ProductInput::default()
        }
    }

    #[test]
    fn test_new_product_defaults() {
        let product = NewProduct::new("Widget").unwrap();
        assert_eq!(product.slug().as_str(), "widget");
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.stock.units(), 1);
        assert_eq!(product.rating.value(), 0);
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_changes_recompute_slug() {
        let changes = ProductChanges::from_input(&input(" Blue Widget ")).unwrap();
        assert_eq!(changes.name, "Blue Widget");
        assert_eq!(changes.slug.as_str(), "blue-widget");
    }

    #[test]
    fn test_changes_sanitize_numbers() {
        let mut edit = input("Widget");
        edit.price = Some("-5".to_owned());
        edit.stock = Some("abc".to_owned());
        edit.rating = Some(-3);
        let changes = ProductChanges::from_input(&edit).unwrap();
        assert_eq!(changes.price, Price::ZERO);
        assert_eq!(changes.stock, Stock::ZERO);
        assert_eq!(changes.rating.value(), 0);
    }

    #[test]
    fn test_changes_keep_valid_numbers() {
        let mut edit = input("Widget");
        edit.price = Some("19.999".to_owned());
        edit.stock = Some("7.9".to_owned());
        edit.rating = Some(4);
        let changes = ProductChanges::from_input(&edit).unwrap();
        assert_eq!(changes.price.to_string(), "20");
        assert_eq!(changes.stock.units(), 7);
        assert_eq!(changes.rating.value(), 4);
    }

    #[test]
    fn test_changes_absent_numbers_are_zero() {
        let changes = ProductChanges::from_input(&input("Widget")).unwrap();
        assert_eq!(changes.price, Price::ZERO);
        assert_eq!(changes.stock, Stock::ZERO);
    }

    #[test]
    fn test_changes_blank_text_is_none() {
        let mut edit = input("Widget");
        edit.category = Some("  ".to_owned());
        edit.description = Some(String::new());
        let changes = ProductChanges::from_input(&edit).unwrap();
        assert_eq!(changes.category, None);
        assert_eq!(changes.description, None);
    }

    #[test]
    fn test_changes_reject_bad_name() {
        assert!(ProductChanges::from_input(&input("   ")).is_err());
        assert!(ProductChanges::from_input(&input("???")).is_err());
    }

    #[test]
    fn test_changes_reject_bad_image() {
        let mut edit = input("Widget");
        edit.images = serde_json::from_str(r#"[{"key": "k1", "name": "a.png", "url": "nope"}]"#)
            .unwrap();
        assert!(matches!(
            ProductChanges::from_input(&edit),
            Err(ValidationError::Document(_))
        ));
    }

    #[test]
    fn test_input_deserializes_form_shape() {
        let edit: ProductInput = serde_json::from_str(
            r#"{"name": "Widget", "price": "12.50", "stock": "3", "images": []}"#,
        )
        .unwrap();
        assert_eq!(edit.price.as_deref(), Some("12.50"));
        assert_eq!(edit.category, None);
    }
}
