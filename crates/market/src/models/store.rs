//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use commerce_core::{Slug, StoreId, unique_store_code};

use super::{ValidationError, required_text};

/// A store (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name, unique across stores.
    pub name: String,
    /// URL slug derived from `name`.
    pub slug: Slug,
    /// Free-form description.
    pub description: String,
    /// Whether the store is open.
    pub active: bool,
    /// Username of the owning user, if any.
    pub store_owner_name: Option<String>,
    /// `<owner>:<name>` code, set together with the owner.
    pub unique_store_code: Option<String>,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    name: String,
    slug: Slug,
    description: String,
    owner_name: Option<String>,
    /// Whether the store starts out open.
    pub active: bool,
}

impl NewStore {
    /// Validate a store name and description.
    ///
    /// The store starts inactive and without an owner.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank, too long, or yields
    /// no slug.
    pub fn new(name: &str, description: &str) -> Result<Self, ValidationError> {
        let name = required_text("name", name)?;
        let slug = Slug::from_name(&name)?;
        Ok(Self {
            name,
            slug,
            description: description.trim().to_owned(),
            owner_name: None,
            active: false,
        })
    }

    /// Attach an owner by username.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the username is blank or too long.
    pub fn with_owner(mut self, owner_name: &str) -> Result<Self, ValidationError> {
        self.owner_name = Some(required_text("store owner name", owner_name)?);
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn slug(&self) -> &Slug {
        &self.slug
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        self.owner_name.as_deref()
    }

    /// The `<owner>:<name>` code, present only when an owner is set.
    #[must_use]
    pub fn unique_store_code(&self) -> Option<String> {
        self.owner_name
            .as_deref()
            .map(|owner| unique_store_code(owner, &self.name))
    }
}

/// Validated changes to an existing store's name and description.
#[derive(Debug, Clone)]
pub struct StoreChanges {
    name: String,
    slug: Slug,
    description: Option<String>,
}

impl StoreChanges {
    /// Validate a renamed store. The slug is recomputed from the new name.
    ///
    /// A `None` description keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` under the same rules as [`NewStore::new`].
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, ValidationError> {
        let name = required_text("name", name)?;
        let slug = Slug::from_name(&name)?;
        let description = description.map(|d| d.trim().to_owned());
        Ok(Self {
            name,
            slug,
            description,
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

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_derives_slug() {
        let store = NewStore::new("  Acme Widgets ", "Tools").unwrap();
        assert_eq!(store.name(), "Acme Widgets");
        assert_eq!(store.slug().as_str(), "acme-widgets");
        assert!(!store.active);
        assert_eq!(store.unique_store_code(), None);
    }

    #[test]
    fn test_new_store_with_owner() {
        let store = NewStore::new("Acme", "").unwrap().with_owner("hendry").unwrap();
        assert_eq!(store.owner_name(), Some("hendry"));
        assert_eq!(store.unique_store_code().as_deref(), Some("hendry:Acme"));
    }

    #[test]
    fn test_new_store_rejects_unsluggable_name() {
        assert!(matches!(
            NewStore::new("!!!", ""),
            Err(ValidationError::Slug(_))
        ));
        assert!(matches!(
            NewStore::new("", ""),
            Err(ValidationError::Empty { field: "name" })
        ));
    }

    #[test]
    fn test_store_changes_recompute_slug() {
        let changes = StoreChanges::new("Acme Two", None).unwrap();
        assert_eq!(changes.slug().as_str(), "acme-two");
        assert_eq!(changes.description(), None);
    }

    #[test]
    fn test_store_changes_accept_long_description() {
        let long = "x".repeat(300);
        let changes = StoreChanges::new("Acme", Some(&long)).unwrap();
        assert_eq!(changes.description().map(str::len), Some(300));

        let blank = StoreChanges::new("Acme", Some("  ")).unwrap();
        assert_eq!(blank.description(), Some(""));
    }
}
