//! Structured JSON documents stored in `JSONB` columns.
//!
//! The database only sees an opaque blob. These types declare the shape, and
//! [`Document::validate`] is run by the repositories on both read and write so
//! a malformed blob never crosses the application boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ProductId;

/// Errors raised when a document does not match its declared shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// An uploaded file key is empty.
    #[error("file key cannot be empty")]
    EmptyFileKey,
    /// An image URL is not an absolute http(s) URL.
    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),
    /// A cart line has a quantity of zero.
    #[error("cart line for product {0} has zero quantity")]
    ZeroQuantity(ProductId),
    /// The same product appears on two cart lines.
    #[error("product {0} appears on more than one cart line")]
    DuplicateCartLine(ProductId),
    /// A metadata key is empty.
    #[error("metadata keys cannot be empty")]
    EmptyMetadataKey,
}

/// A document persisted in a `JSONB` column.
pub trait Document: Serialize + for<'de> Deserialize<'de> + Default {
    /// Check invariants that serde alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn validate(&self) -> Result<(), DocumentError>;
}

/// Opaque identifier of a file stored at the upload provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    /// Parse a file key.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::EmptyFileKey` if the key is blank.
    pub fn parse(s: &str) -> Result<Self, DocumentError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DocumentError::EmptyFileKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for FileKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uploaded product image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// Key at the upload provider (used for deletion).
    pub key: FileKey,
    /// Original file name.
    pub name: String,
    /// Public URL of the file.
    pub url: String,
}

impl Document for Vec<ImageData> {
    fn validate(&self) -> Result<(), DocumentError> {
        for image in self {
            if image.key.as_str().trim().is_empty() {
                return Err(DocumentError::EmptyFileKey);
            }
            if !(image.url.starts_with("https://") || image.url.starts_with("http://")) {
                return Err(DocumentError::InvalidImageUrl(image.url.clone()));
            }
        }
        Ok(())
    }
}

/// One line of a shopping cart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product on this line.
    pub product_id: ProductId,
    /// Number of units, at least one.
    pub quantity: u32,
}

impl Document for Vec<CartItem> {
    fn validate(&self) -> Result<(), DocumentError> {
        let mut seen = Vec::with_capacity(self.len());
        for item in self {
            if item.quantity == 0 {
                return Err(DocumentError::ZeroQuantity(item.product_id));
            }
            if seen.contains(&item.product_id) {
                return Err(DocumentError::DuplicateCartLine(item.product_id));
            }
            seen.push(item.product_id);
        }
        Ok(())
    }
}

/// String-to-string metadata attached to a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// Create empty metadata.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Document for Metadata {
    fn validate(&self) -> Result<(), DocumentError> {
        if self.0.keys().any(|k| k.trim().is_empty()) {
            return Err(DocumentError::EmptyMetadataKey);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image(key: &str, url: &str) -> ImageData {
        ImageData {
            key: FileKey(key.to_owned()),
            name: "photo.png".to_owned(),
            url: url.to_owned(),
        }
    }

    #[test]
    fn test_file_key_parse() {
        assert_eq!(FileKey::parse(" abc ").unwrap().as_str(), "abc");
        assert_eq!(FileKey::parse("  "), Err(DocumentError::EmptyFileKey));
    }

    #[test]
    fn test_images_json_shape() {
        let images = vec![image("k1", "https://utfs.io/f/k1")];
        let json = serde_json::to_value(&images).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"key": "k1", "name": "photo.png", "url": "https://utfs.io/f/k1"}])
        );
    }

    #[test]
    fn test_images_validate() {
        assert!(Vec::<ImageData>::new().validate().is_ok());
        assert!(vec![image("k1", "https://utfs.io/f/k1")].validate().is_ok());
        assert_eq!(
            vec![image(" ", "https://utfs.io/f/k1")].validate(),
            Err(DocumentError::EmptyFileKey)
        );
        assert!(matches!(
            vec![image("k1", "ftp://x")].validate(),
            Err(DocumentError::InvalidImageUrl(_))
        ));
    }

    #[test]
    fn test_cart_items_json_shape() {
        let items: Vec<CartItem> =
            serde_json::from_str(r#"[{"productId": 3, "quantity": 2}]"#).unwrap();
        assert_eq!(
            items,
            vec![CartItem {
                product_id: ProductId::new(3),
                quantity: 2
            }]
        );
    }

    #[test]
    fn test_cart_items_validate() {
        let line = |id, quantity| CartItem {
            product_id: ProductId::new(id),
            quantity,
        };
        assert!(vec![line(1, 1), line(2, 5)].validate().is_ok());
        assert_eq!(
            vec![line(1, 0)].validate(),
            Err(DocumentError::ZeroQuantity(ProductId::new(1)))
        );
        assert_eq!(
            vec![line(1, 1), line(1, 2)].validate(),
            Err(DocumentError::DuplicateCartLine(ProductId::new(1)))
        );
    }

    #[test]
    fn test_cart_items_reject_negative_quantity() {
        let parsed = serde_json::from_str::<Vec<CartItem>>(r#"[{"productId": 1, "quantity": -1}]"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_metadata() {
        let mut metadata = Metadata::new();
        assert!(metadata.is_empty());
        metadata.insert("theme", "dark");
        assert_eq!(metadata.get("theme"), Some("dark"));
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#"{"theme":"dark"}"#);

        metadata.insert(" ", "x");
        assert_eq!(metadata.validate(), Err(DocumentError::EmptyMetadataKey));
        metadata.remove(" ");
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_empty_documents_serialize_to_empty_structures() {
        assert_eq!(serde_json::to_string(&Vec::<ImageData>::new()).unwrap(), "[]");
        assert_eq!(serde_json::to_string(&Metadata::default()).unwrap(), "{}");
    }
}
