//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes and JSON metadata
//! - `stores` - Stores, optionally owned by a user
//! - `products` - Catalog entries, optionally attached to a store
//! - `verify_emails` - One-time email verification codes
//! - `carts` - Shopping carts with JSON line items
//!
//! # Migrations
//!
//! Migrations are stored in `crates/market/migrations/`, embedded in
//! [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p commerce-cli -- migrate
//! ```

pub mod carts;
pub mod products;
pub mod stores;
pub mod users;
pub mod verify_emails;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use products::ProductRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;
pub use verify_emails::{VerifyEmailRepository, VerifyError};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Uniqueness violation (e.g., duplicate slug).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referential or check constraint violation.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The row exists but may no longer be modified.
    #[error("immutable: {0}")]
    Immutable(String),
}

impl RepositoryError {
    /// Whether this error is a uniqueness conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db_err) => {
                classify(&db_err.kind(), db_err.constraint(), db_err.message())
            }
            _ => None,
        };
        classified.unwrap_or(Self::Database(err))
    }
}

/// Map a database-reported constraint failure to a typed error.
fn classify(kind: &ErrorKind, constraint: Option<&str>, message: &str) -> Option<RepositoryError> {
    let constraint = constraint.unwrap_or_default();
    match kind {
        ErrorKind::UniqueViolation => {
            let detail = match constraint {
                "stores_slug_key" => "store slug already exists",
                "stores_name_key" => "store name already exists",
                "products_slug_key" => "product slug already exists",
                "products_name_key" => "product name already exists",
                "users_username_key" => "username already exists",
                _ => return Some(RepositoryError::Conflict(message.to_owned())),
            };
            Some(RepositoryError::Conflict(detail.to_owned()))
        }
        ErrorKind::ForeignKeyViolation => {
            let detail = match constraint {
                "products_store_id_fkey" => "store does not exist",
                "stores_owner_fkey" => "store owner does not exist",
                "verify_emails_username_fkey" => "user does not exist",
                _ => return Some(RepositoryError::Constraint(message.to_owned())),
            };
            Some(RepositoryError::Constraint(detail.to_owned()))
        }
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            Some(RepositoryError::Constraint(message.to_owned()))
        }
        _ => None,
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
