//! SQLite persistence
//!
//! Module-level async functions over a shared [`SqlitePool`], one
//! submodule per record family. Timestamps are stored as RFC3339 text
//! and always bound explicitly so reads parse back cleanly.

pub mod catalog;
pub mod customer_records;
pub mod pricing_models;
pub mod retry;

use std::path::Path;

use chrono::{DateTime, Utc};
use opsdesk_common::{Error, Result};
use sqlx::SqlitePool;

/// Opens the service database, creating file and schema as needed.
pub async fn init_database_pool(database_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database_url = format!("sqlite://{}?mode=rwc", database_path.display());
    let pool = SqlitePool::connect(&database_url).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Creates every table this service relies on. Idempotent.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pricing_models (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL UNIQUE,
            weights BLOB NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customer_orders (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL,
            status TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customer_operations (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL,
            assignee TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS qa_reviews (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL,
            verdict TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intake_records (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL,
            sub_product_a INTEGER,
            sub_product_b INTEGER,
            sub_product_c INTEGER,
            sub_service_a INTEGER,
            sub_service_b INTEGER,
            sub_service_c INTEGER,
            status TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sub_products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            price REAL NOT NULL,
            secondary_metric REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sub_services (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            price REAL NOT NULL,
            secondary_metric REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("invalid timestamp '{}': {}", raw, e)))
}
