//! Bookkeeping records opened for a customer on their first training run
//!
//! Each accessor is get-or-create: the existing row wins, otherwise a
//! fresh one is inserted with defaults. The bootstrap stage calls all
//! four in sequence.

use chrono::Utc;
use opsdesk_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::{CatalogCache, CatalogItem, CustomerOperation, CustomerOrder, IntakeRecord, QaReview};

use super::parse_timestamp;

pub async fn get_or_create_order(pool: &SqlitePool, customer_id: i64) -> Result<CustomerOrder> {
    let row = sqlx::query(
        "SELECT id, customer_id, status, created_at FROM customer_orders WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        return Ok(CustomerOrder {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            status: row.get("status"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        });
    }

    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO customer_orders (customer_id, status, created_at) VALUES (?, ?, ?)")
            .bind(customer_id)
            .bind("open")
            .bind(now.to_rfc3339())
            .execute(pool)
            .await?;

    Ok(CustomerOrder {
        id: result.last_insert_rowid(),
        customer_id,
        status: Some("open".to_string()),
        created_at: now,
    })
}

pub async fn get_or_create_operation(
    pool: &SqlitePool,
    customer_id: i64,
) -> Result<CustomerOperation> {
    let row = sqlx::query(
        "SELECT id, customer_id, assignee, created_at FROM customer_operations WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        return Ok(CustomerOperation {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            assignee: row.get("assignee"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        });
    }

    // New operations start unassigned
    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO customer_operations (customer_id, created_at) VALUES (?, ?)")
            .bind(customer_id)
            .bind(now.to_rfc3339())
            .execute(pool)
            .await?;

    Ok(CustomerOperation {
        id: result.last_insert_rowid(),
        customer_id,
        assignee: None,
        created_at: now,
    })
}

pub async fn get_or_create_qa_review(pool: &SqlitePool, customer_id: i64) -> Result<QaReview> {
    let row = sqlx::query(
        "SELECT id, customer_id, verdict, created_at FROM qa_reviews WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        return Ok(QaReview {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            verdict: row.get("verdict"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        });
    }

    let now = Utc::now();
    let result =
        sqlx::query("INSERT INTO qa_reviews (customer_id, verdict, created_at) VALUES (?, ?, ?)")
            .bind(customer_id)
            .bind("pending")
            .bind(now.to_rfc3339())
            .execute(pool)
            .await?;

    Ok(QaReview {
        id: result.last_insert_rowid(),
        customer_id,
        verdict: Some("pending".to_string()),
        created_at: now,
    })
}

/// Get-or-create the intake record that names which catalog entries a
/// customer's training draws from. New intakes reference the first three
/// sub-products and first three sub-services in catalog order.
pub async fn get_or_create_intake(
    pool: &SqlitePool,
    customer_id: i64,
    catalog: &CatalogCache,
) -> Result<IntakeRecord> {
    let row = sqlx::query(
        r#"
        SELECT id, customer_id, sub_product_a, sub_product_b, sub_product_c,
               sub_service_a, sub_service_b, sub_service_c, status, created_at
        FROM intake_records WHERE customer_id = ?
        "#,
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        let sub_products: [Option<i64>; 3] = [
            row.get("sub_product_a"),
            row.get("sub_product_b"),
            row.get("sub_product_c"),
        ];
        let sub_services: [Option<i64>; 3] = [
            row.get("sub_service_a"),
            row.get("sub_service_b"),
            row.get("sub_service_c"),
        ];
        return Ok(IntakeRecord {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            sub_products,
            sub_services,
            status: row.get("status"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        });
    }

    let sub_products = first_three_ids(&catalog.products);
    let sub_services = first_three_ids(&catalog.services);
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO intake_records
            (customer_id, sub_product_a, sub_product_b, sub_product_c,
             sub_service_a, sub_service_b, sub_service_c, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(customer_id)
    .bind(sub_products[0])
    .bind(sub_products[1])
    .bind(sub_products[2])
    .bind(sub_services[0])
    .bind(sub_services[1])
    .bind(sub_services[2])
    .bind("received")
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(IntakeRecord {
        id: result.last_insert_rowid(),
        customer_id,
        sub_products,
        sub_services,
        status: Some("received".to_string()),
        created_at: now,
    })
}

fn first_three_ids(items: &[CatalogItem]) -> [Option<i64>; 3] {
    let mut ids = [None; 3];
    for (slot, item) in ids.iter_mut().zip(items) {
        *slot = Some(item.id);
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::{load_catalog, seed_default_catalog};
    use crate::db::init_tables;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.expect("pool");
        init_tables(&pool).await.expect("tables");
        pool
    }

    #[tokio::test]
    async fn test_order_get_or_create_is_idempotent() {
        let pool = test_pool().await;

        let first = get_or_create_order(&pool, 42).await.expect("create");
        let second = get_or_create_order(&pool, 42).await.expect("fetch");
        assert_eq!(first.id, second.id);
        assert_eq!(second.status.as_deref(), Some("open"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_orders")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_operation_starts_unassigned() {
        let pool = test_pool().await;
        let operation = get_or_create_operation(&pool, 7).await.expect("create");
        assert_eq!(operation.assignee, None);

        let again = get_or_create_operation(&pool, 7).await.expect("fetch");
        assert_eq!(operation.id, again.id);
    }

    #[tokio::test]
    async fn test_qa_review_defaults_to_pending() {
        let pool = test_pool().await;
        let review = get_or_create_qa_review(&pool, 9).await.expect("create");
        assert_eq!(review.verdict.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn test_intake_references_leading_catalog_entries() {
        let pool = test_pool().await;
        seed_default_catalog(&pool).await.expect("seed");
        let catalog = load_catalog(&pool).await.expect("load");

        let intake = get_or_create_intake(&pool, 42, &catalog).await.expect("create");
        let expected_products: [Option<i64>; 3] = [
            Some(catalog.products[0].id),
            Some(catalog.products[1].id),
            Some(catalog.products[2].id),
        ];
        assert_eq!(intake.sub_products, expected_products);
        assert!(intake.sub_services.iter().all(|s| s.is_some()));

        let again = get_or_create_intake(&pool, 42, &catalog).await.expect("fetch");
        assert_eq!(intake.id, again.id);
        assert_eq!(intake.sub_products, again.sub_products);
    }

    #[tokio::test]
    async fn test_intake_with_empty_catalog_leaves_slots_null() {
        let pool = test_pool().await;
        let catalog = CatalogCache::default();

        let intake = get_or_create_intake(&pool, 1, &catalog).await.expect("create");
        assert_eq!(intake.sub_products, [None, None, None]);
        assert_eq!(intake.sub_services, [None, None, None]);
    }
}
