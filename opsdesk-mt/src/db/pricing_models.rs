//! Persisted model parameters, one row per customer

use chrono::Utc;
use opsdesk_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::PricingModel;

use super::parse_timestamp;
use super::retry::{retry_on_lock, DB_MAX_LOCK_WAIT_MS};

pub async fn find_by_customer(pool: &SqlitePool, customer_id: i64) -> Result<Option<PricingModel>> {
    let row = sqlx::query(
        "SELECT id, customer_id, weights, created_at, updated_at FROM pricing_models WHERE customer_id = ?",
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(PricingModel {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            weights: row.get("weights"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
            updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
        })),
        None => Ok(None),
    }
}

/// Inserts a new model under the next free id
///
/// The id comes from MAX(id) + 1 computed inside the same transaction as
/// the insert, so two first-time runs committing together cannot claim
/// the same id. Lock contention is retried.
pub async fn insert_with_next_id(
    pool: &SqlitePool,
    customer_id: i64,
    weights: &[u8],
) -> Result<PricingModel> {
    retry_on_lock("pricing_models.insert", DB_MAX_LOCK_WAIT_MS, || {
        insert_once(pool, customer_id, weights)
    })
    .await
}

async fn insert_once(pool: &SqlitePool, customer_id: i64, weights: &[u8]) -> Result<PricingModel> {
    let mut tx = pool.begin().await?;

    let max_id: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM pricing_models")
        .fetch_one(&mut *tx)
        .await?;
    let id = max_id + 1;
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO pricing_models (id, customer_id, weights, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(customer_id)
    .bind(weights)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(PricingModel {
        id,
        customer_id,
        weights: weights.to_vec(),
        created_at: now,
        updated_at: now,
    })
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
    async fn test_ids_increment_from_one() {
        let pool = test_pool().await;

        let first = insert_with_next_id(&pool, 10, &[1, 2, 3]).await.expect("insert");
        let second = insert_with_next_id(&pool, 11, &[4, 5, 6]).await.expect("insert");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_next_id_follows_existing_maximum() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO pricing_models (id, customer_id, weights, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(50i64)
        .bind(1i64)
        .bind(&[0u8][..])
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("manual insert");

        let inserted = insert_with_next_id(&pool, 2, &[9]).await.expect("insert");
        assert_eq!(inserted.id, 51);
    }

    #[tokio::test]
    async fn test_find_returns_stored_blob() {
        let pool = test_pool().await;
        let weights = vec![0xDE, 0xAD, 0xBE, 0xEF];
        insert_with_next_id(&pool, 42, &weights).await.expect("insert");

        let found = find_by_customer(&pool, 42)
            .await
            .expect("query")
            .expect("row exists");
        assert_eq!(found.weights, weights);
        assert_eq!(found.customer_id, 42);
    }

    #[tokio::test]
    async fn test_find_misses_unknown_customer() {
        let pool = test_pool().await;
        let found = find_by_customer(&pool, 999).await.expect("query");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_customer_is_rejected() {
        let pool = test_pool().await;
        insert_with_next_id(&pool, 42, &[1]).await.expect("first insert");

        let result = insert_with_next_id(&pool, 42, &[2]).await;
        assert!(result.is_err(), "customer_id carries a UNIQUE constraint");
    }
}
