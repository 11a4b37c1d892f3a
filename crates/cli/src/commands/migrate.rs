//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! commerce-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/market/migrations/` and are embedded in the
//! binary at build time.

use commerce_market::db::MIGRATOR;
use tracing::info;

/// Run all pending marketplace migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;

    info!(available = MIGRATOR.iter().count(), "Running migrations");
    MIGRATOR.run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
