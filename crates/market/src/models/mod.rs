//! Domain models for the marketplace.
//!
//! Constructors on the `New*` and `*Changes` types run all input
//! validation, so repositories only ever see well-formed values.

pub mod cart;
pub mod listing;
pub mod product;
pub mod store;
pub mod user;
pub mod verify_email;

use thiserror::Error;

use commerce_core::{AmountError, DocumentError, EmailError, SlugError};

pub use cart::Cart;
pub use listing::{ProductListParams, ProductPage, ProductSort, SortDirection, SortField};
pub use product::{NewProduct, Product, ProductChanges, ProductInput, ProductWithStore};
pub use store::{NewStore, Store, StoreChanges};
pub use user::{NewUser, User};
pub use verify_email::{NewVerifyEmail, VerifyEmail};

/// Maximum length of `VARCHAR(255)` text columns.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Input rejected before it reaches the database.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains invalid characters")]
    InvalidCharacters { field: &'static str },

    #[error("Store ID is not valid. Please try again later.")]
    InvalidStore,

    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("quantity is too large")]
    QuantityOverflow,

    #[error(transparent)]
    Slug(#[from] SlugError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Trim a required `VARCHAR(255)` value.
pub(crate) fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    check_length(field, trimmed)?;
    Ok(trimmed.to_owned())
}

/// Trim an optional `VARCHAR(255)` value; blank input becomes `None`.
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            check_length(field, v)?;
            Ok(Some(v.to_owned()))
        }
        None => Ok(None),
    }
}

fn check_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(())
}
