//! Integration tests for the store repository.

#![allow(clippy::unwrap_used)]

use commerce_core::{ProductId, Slug};
use commerce_integration_tests::{create_product, create_store, create_user};
use commerce_market::RepositoryError;
use commerce_market::db::{ProductRepository, StoreRepository};
use commerce_market::models::{NewStore, StoreChanges};
use sqlx::PgPool;

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_create_and_fetch_store(pool: PgPool) {
    create_user(&pool, "hendry").await;
    let new_store = NewStore::new("Acme Widgets", "Tools")
        .unwrap()
        .with_owner("hendry")
        .unwrap();

    let repo = StoreRepository::new(&pool);
    let store = repo.create(&new_store).await.unwrap();

    assert_eq!(store.slug.as_str(), "acme-widgets");
    assert_eq!(store.unique_store_code.as_deref(), Some("hendry:Acme Widgets"));
    assert!(!store.active);

    let by_slug = repo
        .get_by_slug(&Slug::parse("acme-widgets").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_slug, store);
    assert!(repo.exists(store.id).await.unwrap());
    assert_eq!(repo.list_all().await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_duplicate_slug_is_conflict(pool: PgPool) {
    let repo = StoreRepository::new(&pool);
    repo.create(&NewStore::new("Acme", "").unwrap()).await.unwrap();

    // Different name, same slug
    let err = repo
        .create(&NewStore::new("ACME!", "").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(ref m) if m == "store slug already exists"));
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_concurrent_inserts_one_wins(pool: PgPool) {
    let repo = StoreRepository::new(&pool);
    let store = NewStore::new("Acme", "").unwrap();

    let (first, second) = tokio::join!(repo.create(&store), repo.create(&store));

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| r.as_ref().is_err_and(RepositoryError::is_conflict))
            .count(),
        1
    );
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_unknown_owner_is_rejected(pool: PgPool) {
    let store = NewStore::new("Acme", "").unwrap().with_owner("ghost").unwrap();
    let err = StoreRepository::new(&pool).create(&store).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Constraint(ref m) if m == "store owner does not exist"));
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_update_recomputes_slug_and_touches_updated_at(pool: PgPool) {
    create_user(&pool, "hendry").await;
    let repo = StoreRepository::new(&pool);
    let store = repo
        .create(&NewStore::new("Acme", "").unwrap().with_owner("hendry").unwrap())
        .await
        .unwrap();

    let changes = StoreChanges::new("Acme Supply", Some("Now with more")).unwrap();
    let updated = repo.update(store.id, &changes).await.unwrap();

    assert_eq!(updated.slug.as_str(), "acme-supply");
    assert_eq!(updated.unique_store_code.as_deref(), Some("hendry:Acme Supply"));
    assert!(updated.updated_at > store.updated_at);
    assert_eq!(updated.created_at, store.created_at);

    let reopened = repo.set_active(store.id, true).await.unwrap();
    assert!(reopened.active);
    assert!(reopened.updated_at > updated.updated_at);
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_update_missing_store_is_not_found(pool: PgPool) {
    let changes = StoreChanges::new("Acme", None).unwrap();
    let err = StoreRepository::new(&pool)
        .update(commerce_core::StoreId::new(404), &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_rename_keeps_long_description(pool: PgPool) {
    let long = "Hand-forged tools. ".repeat(20);
    let repo = StoreRepository::new(&pool);
    let store = repo
        .create(&NewStore::new("Acme", &long).unwrap())
        .await
        .unwrap();
    assert!(store.description.len() > 255);

    let renamed = repo
        .update(store.id, &StoreChanges::new("Acme Supply", None).unwrap())
        .await
        .unwrap();
    assert_eq!(renamed.slug.as_str(), "acme-supply");
    assert_eq!(renamed.description, store.description);

    let replaced = repo
        .update(store.id, &StoreChanges::new("Acme Supply", Some(&long)).unwrap())
        .await
        .unwrap();
    assert_eq!(replaced.description, long.trim());
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_deleting_store_detaches_products(pool: PgPool) {
    let store = create_store(&pool, "Acme").await;
    let product = create_product(&pool, "Widget", Some(store.id), "19.99", None).await;

    StoreRepository::new(&pool).delete(store.id).await.unwrap();

    let products = ProductRepository::new(&pool);
    let orphan = products.get_by_id(product.id).await.unwrap().unwrap();
    assert_eq!(orphan.store_id, None);

    let with_store = products
        .get_by_slug_with_store(&orphan.slug)
        .await
        .unwrap()
        .unwrap();
    assert!(with_store.store.is_none());
    assert!(products.get_by_id(ProductId::new(404)).await.unwrap().is_none());
}
