//! URL-safe slugs derived from display names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing URL-safe is left after normalization.
    #[error("slug cannot be empty")]
    Empty,
    /// The slug does not fit the storage column.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains characters a slug may not hold.
    #[error("invalid slug: {0}")]
    Invalid(String),
}

/// A lowercase, hyphenated, URL-safe identifier.
///
/// Slugs are always derived from a display name with [`Slug::from_name`];
/// callers never choose them. [`Slug::parse`] only validates slugs that
/// arrive from the outside (e.g. a URL path) for lookups.
///
/// ## Examples
///
/// ```
/// use commerce_core::Slug;
///
/// assert_eq!(Slug::from_name("Acme Widgets").unwrap().as_str(), "acme-widgets");
/// assert_eq!(Slug::from_name("  Men's   Shoes!! ").unwrap().as_str(), "mens-shoes");
/// assert!(Slug::from_name("!!!").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug (`VARCHAR(255)`).
    pub const MAX_LENGTH: usize = 255;

    /// Derive a slug from a display name.
    ///
    /// ASCII letters and digits are kept (lowercased), runs of whitespace,
    /// `-` and `_` become a single hyphen, everything else is dropped.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if no URL-safe character remains, or
    /// `SlugError::TooLong` if the result exceeds 255 characters.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else if c.is_whitespace() || c == '-' || c == '_' {
                pending_hyphen = true;
            }
        }

        Self::check_length(&slug)?;
        Ok(Self(slug))
    }

    /// Validate an existing slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or not already in
    /// canonical slug form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        Self::check_length(s)?;

        let canonical = s.split('-').all(|part| {
            !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if !canonical {
            return Err(SlugError::Invalid(s.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }

    fn check_length(s: &str) -> Result<(), SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(())
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the `<ownerName>:<storeName>` code that identifies a store together
/// with its owner.
#[must_use]
pub fn unique_store_code(owner_name: &str, store_name: &str) -> String {
    format!("{owner_name}:{store_name}")
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Only slugs built by `from_name` are ever written
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Widget").unwrap().as_str(), "widget");
        assert_eq!(Slug::from_name("Acme").unwrap().as_str(), "acme");
        assert_eq!(
            Slug::from_name("Blue Suede Shoes").unwrap().as_str(),
            "blue-suede-shoes"
        );
    }

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(
            Slug::from_name("  a -- b __ c  ").unwrap().as_str(),
            "a-b-c"
        );
    }

    #[test]
    fn test_from_name_drops_punctuation() {
        assert_eq!(Slug::from_name("Men's Shoes!").unwrap().as_str(), "mens-shoes");
        assert_eq!(Slug::from_name("Tom & Jerry").unwrap().as_str(), "tom-jerry");
        assert_eq!(Slug::from_name("Café 2000").unwrap().as_str(), "caf-2000");
    }

    #[test]
    fn test_from_name_empty() {
        assert_eq!(Slug::from_name(""), Err(SlugError::Empty));
        assert_eq!(Slug::from_name("  ?! "), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_name_too_long() {
        let name = "a".repeat(256);
        assert!(matches!(
            Slug::from_name(&name),
            Err(SlugError::TooLong { .. })
        ));
    }

    #[test]
    fn test_from_name_is_idempotent() {
        let slug = Slug::from_name("Hello World 42").unwrap();
        assert_eq!(Slug::from_name(slug.as_str()).unwrap(), slug);
        assert_eq!(Slug::parse(slug.as_str()).unwrap(), slug);
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(Slug::parse("Widget").is_err());
        assert!(Slug::parse("-widget").is_err());
        assert!(Slug::parse("wid--get").is_err());
        assert!(Slug::parse("wid get").is_err());
        assert!(Slug::parse("widget-2").is_ok());
    }

    #[test]
    fn test_unique_store_code() {
        assert_eq!(unique_store_code("hendry", "Acme"), "hendry:Acme");
    }

    #[test]
    fn test_serde_transparent() {
        let slug = Slug::from_name("Acme").unwrap();
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"acme\"");
    }
}
