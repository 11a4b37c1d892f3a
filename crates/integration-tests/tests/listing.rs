//! Integration tests for catalog listing: filters, sorting and pagination.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};

use commerce_core::ProductId;
use commerce_integration_tests::{create_product, create_store};
use commerce_market::db::ProductRepository;
use commerce_market::models::ProductListParams;
use rust_decimal::Decimal;
use sqlx::PgPool;

async fn seed_catalog(pool: &PgPool) {
    let acme = create_store(pool, "Acme").await;
    let bolt = create_store(pool, "Bolt").await;

    for i in 0..13 {
        // Repeated prices so ties must be broken by id
        let price = format!("{}.50", i % 4);
        let category = if i % 2 == 0 { "tools" } else { "parts" };
        create_product(pool, &format!("Acme Item {i:02}"), Some(acme.id), &price, Some(category))
            .await;
    }
    for i in 0..7 {
        let price = format!("{}", 10 + i);
        create_product(pool, &format!("Bolt Item {i:02}"), Some(bolt.id), &price, Some("parts"))
            .await;
    }
    create_product(pool, "Loose Item", None, "5", Some("tools")).await;
}

fn params(pairs: &[(&str, &str)]) -> ProductListParams {
    let query: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    ProductListParams::from_query(&query)
}

/// Walk every page and check it reproduces the unpaginated result.
async fn assert_pages_cover_result(pool: &PgPool, mut base: ProductListParams) {
    let repo = ProductRepository::new(pool);
    let total = repo.count(&base).await.unwrap();
    let page_count = repo.page_count(&base).await.unwrap();
    assert_eq!(page_count, total.div_ceil(u64::from(base.effective_page_size())));

    let mut full = base.clone();
    full.page = 1;
    full.page_size = 100;
    let expected: Vec<ProductId> = repo
        .list_page(&full)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.product.id)
        .collect();
    assert_eq!(expected.len() as u64, total);

    let mut collected = Vec::new();
    for page in 1..=page_count {
        base.page = u32::try_from(page).unwrap();
        let items = repo.list_page(&base).await.unwrap();
        assert!(!items.is_empty());
        assert!(items.len() <= base.effective_page_size() as usize);
        collected.extend(items.into_iter().map(|item| item.product.id));
    }

    assert_eq!(collected, expected);
    let unique: HashSet<_> = collected.iter().collect();
    assert_eq!(unique.len(), collected.len());

    // One past the last page is empty
    base.page = u32::try_from(page_count + 1).unwrap();
    assert!(repo.list_page(&base).await.unwrap().is_empty());
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_pages_cover_result_for_each_filter(pool: PgPool) {
    seed_catalog(&pool).await;

    for pairs in [
        vec![("page_size", "4")],
        vec![("page_size", "3"), ("sort", "price.asc")],
        vec![("page_size", "5"), ("sort", "price.desc"), ("category", "parts")],
        vec![("page_size", "2"), ("sellers", "acme"), ("sort", "stock.desc")],
        vec![("page_size", "6"), ("pmin", "1"), ("pmax", "12"), ("sort", "createdAt.desc")],
        vec![("page_size", "7"), ("sellers", "acme.bolt"), ("category", "tools.parts")],
    ] {
        assert_pages_cover_result(&pool, params(&pairs)).await;
    }

    // Page sizes set directly, outside the accepted range
    for page_size in [0, 250] {
        let base = ProductListParams {
            page_size,
            ..ProductListParams::default()
        };
        assert_pages_cover_result(&pool, base).await;
    }
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_filters(pool: PgPool) {
    seed_catalog(&pool).await;
    let repo = ProductRepository::new(&pool);

    assert_eq!(repo.count(&params(&[])).await.unwrap(), 21);
    assert_eq!(repo.count(&params(&[("sellers", "bolt")])).await.unwrap(), 7);
    // Products without a store never match a seller filter
    assert_eq!(repo.count(&params(&[("sellers", "acme.bolt")])).await.unwrap(), 20);
    assert_eq!(repo.count(&params(&[("category", "tools")])).await.unwrap(), 8);
    assert_eq!(
        repo.count(&params(&[("pmin", "10"), ("pmax", "12")]))
            .await
            .unwrap(),
        3
    );
    assert_eq!(repo.count(&params(&[("sellers", "nobody")])).await.unwrap(), 0);
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_sorting(pool: PgPool) {
    seed_catalog(&pool).await;
    let repo = ProductRepository::new(&pool);

    let page = repo
        .list_page(&params(&[("sort", "price.desc"), ("page_size", "100")]))
        .await
        .unwrap();
    let prices: Vec<Decimal> = page.iter().map(|item| item.product.price.amount()).collect();
    assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(page[0].product.name, "Bolt Item 06");
    assert_eq!(page[0].store.as_ref().unwrap().name, "Bolt");

    let by_name = repo.list_page(&params(&[("page_size", "1")])).await.unwrap();
    assert_eq!(by_name[0].product.name, "Acme Item 00");
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_page_summary(pool: PgPool) {
    seed_catalog(&pool).await;

    let page = ProductRepository::new(&pool)
        .page(&params(&[("page", "3"), ("page_size", "10")]))
        .await
        .unwrap();

    assert_eq!(page.total, 21);
    assert_eq!(page.page_count, 3);
    assert_eq!(page.page, 3);
    assert_eq!(page.items.len(), 1);
}

#[sqlx::test(migrator = "commerce_market::db::MIGRATOR")]
#[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
async fn test_empty_catalog(pool: PgPool) {
    let repo = ProductRepository::new(&pool);
    let params = ProductListParams::default();
    assert_eq!(repo.count(&params).await.unwrap(), 0);
    assert_eq!(repo.page_count(&params).await.unwrap(), 0);
    assert!(repo.list_page(&params).await.unwrap().is_empty());
}
