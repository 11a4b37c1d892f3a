//! CLI subcommands.

pub mod migrate;
pub mod products;
pub mod seed;
pub mod stores;

use commerce_market::{MarketConfig, db};
use sqlx::PgPool;

/// Load configuration and open a pool.
async fn connect() -> Result<(MarketConfig, PgPool), Box<dyn std::error::Error>> {
    let config = MarketConfig::from_env()?;
    let pool = db::create_pool(&config.database_url, config.max_connections).await?;
    tracing::info!("Connected to database");
    Ok((config, pool))
}
