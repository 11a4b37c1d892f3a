//! Commerce Market library.
//!
//! The storage layer of a multi-vendor marketplace:
//!
//! - [`db`] - `PostgreSQL` schema, migrations and repositories for users,
//!   stores, products, email verification codes and carts
//! - [`models`] - Domain types and input validation
//! - [`actions`] - Seller mutations that touch both the database and the
//!   upload provider
//! - [`uploads`] - Upload provider client
//! - [`config`] - Environment-based configuration
//!
//! Rendering, routing and authentication live with the caller; every
//! operation here takes an explicit `&PgPool`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actions;
pub mod config;
pub mod db;
pub mod models;
pub mod uploads;

pub use actions::ActionError;
pub use config::{ConfigError, MarketConfig, UploadConfig};
pub use db::RepositoryError;
pub use models::ValidationError;
pub use uploads::{FileStorage, UploadError, UploadThingClient};
