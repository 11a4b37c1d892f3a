//! Store inspection commands.

use commerce_market::db::StoreRepository;
use tracing::info;

/// List every store.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (_, pool) = super::connect().await?;
    let stores = StoreRepository::new(&pool).list_all().await?;

    info!("Stores ({})", stores.len());
    for store in &stores {
        info!(
            "  #{} {} ({}) active={} owner={}",
            store.id,
            store.name,
            store.slug,
            store.active,
            store.store_owner_name.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
