//! Catalog tables for sub-products and sub-services

use opsdesk_common::Result;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::models::{CatalogCache, CatalogItem, CatalogKind};

/// Rows inserted on first startup when the catalog is empty:
/// (name, quantity, price, secondary_metric)
const DEFAULT_PRODUCTS: [(&str, i64, f64, f64); 3] = [
    ("compact relay", 1, 100.0, 4.0),
    ("standard relay", 1, 200.0, 8.0),
    ("industrial relay", 1, 300.0, 15.0),
];

const DEFAULT_SERVICES: [(&str, i64, f64, f64); 3] = [
    ("bench calibration", 1, 150.0, 5.0),
    ("site inspection", 1, 250.0, 9.0),
    ("annual maintenance", 1, 350.0, 14.0),
];

/// Inserts the default catalog rows if both catalog tables are empty.
pub async fn seed_default_catalog(pool: &SqlitePool) -> Result<()> {
    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sub_products")
        .fetch_one(pool)
        .await?;
    let service_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sub_services")
        .fetch_one(pool)
        .await?;
    if product_count > 0 || service_count > 0 {
        return Ok(());
    }

    for (name, quantity, price, metric) in DEFAULT_PRODUCTS {
        sqlx::query(
            "INSERT INTO sub_products (name, quantity, price, secondary_metric) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(quantity)
        .bind(price)
        .bind(metric)
        .execute(pool)
        .await?;
    }
    for (name, quantity, price, metric) in DEFAULT_SERVICES {
        sqlx::query(
            "INSERT INTO sub_services (name, quantity, price, secondary_metric) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(quantity)
        .bind(price)
        .bind(metric)
        .execute(pool)
        .await?;
    }

    info!(
        "Seeded default catalog: {} sub-products, {} sub-services",
        DEFAULT_PRODUCTS.len(),
        DEFAULT_SERVICES.len()
    );
    Ok(())
}

/// Loads both catalog tables into an in-memory cache, ordered by id.
pub async fn load_catalog(pool: &SqlitePool) -> Result<CatalogCache> {
    let mut cache = CatalogCache::default();

    let rows = sqlx::query(
        "SELECT id, name, quantity, price, secondary_metric FROM sub_products ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in rows {
        cache.products.push(CatalogItem {
            id: row.get("id"),
            name: row.get("name"),
            kind: CatalogKind::Product,
            quantity: row.get("quantity"),
            price: row.get("price"),
            secondary_metric: row.get("secondary_metric"),
        });
    }

    let rows = sqlx::query(
        "SELECT id, name, quantity, price, secondary_metric FROM sub_services ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    for row in rows {
        cache.services.push(CatalogItem {
            id: row.get("id"),
            name: row.get("name"),
            kind: CatalogKind::Service,
            quantity: row.get("quantity"),
            price: row.get("price"),
            secondary_metric: row.get("secondary_metric"),
        });
    }

    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.expect("pool");
        init_tables(&pool).await.expect("tables");
        pool
    }

    #[tokio::test]
    async fn test_seed_populates_empty_catalog() {
        let pool = test_pool().await;
        seed_default_catalog(&pool).await.expect("seed");

        let catalog = load_catalog(&pool).await.expect("load");
        assert_eq!(catalog.products.len(), 3);
        assert_eq!(catalog.services.len(), 3);

        let prices: Vec<f64> = catalog.products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![100.0, 200.0, 300.0]);
        let metrics: Vec<Option<f64>> = catalog.products.iter().map(|p| p.secondary_metric).collect();
        assert_eq!(metrics, vec![Some(4.0), Some(8.0), Some(15.0)]);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = test_pool().await;
        seed_default_catalog(&pool).await.expect("first seed");
        seed_default_catalog(&pool).await.expect("second seed");

        let catalog = load_catalog(&pool).await.expect("load");
        assert_eq!(catalog.total_len(), 6);
    }

    #[tokio::test]
    async fn test_load_orders_by_id_and_tags_kind() {
        let pool = test_pool().await;
        seed_default_catalog(&pool).await.expect("seed");

        let catalog = load_catalog(&pool).await.expect("load");
        let ids: Vec<i64> = catalog.services.iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert!(catalog.services.iter().all(|s| s.kind == CatalogKind::Service));
    }
}
