//! Core types for the commerce marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod document;
pub mod email;
pub mod id;
pub mod price;
pub mod slug;

pub use document::{CartItem, Document, DocumentError, FileKey, ImageData, Metadata};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{AmountError, Price, Rating, Stock};
pub use slug::{Slug, SlugError, unique_store_code};
