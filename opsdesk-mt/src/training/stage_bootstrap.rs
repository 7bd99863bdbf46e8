//! Bootstrap stage: resolve the customer's model and bookkeeping records
//!
//! Runs alone before the concurrent branches. A customer with a
//! persisted model skips training entirely; otherwise a baseline model
//! is fitted against the full catalog and stored under the next free
//! record id. Either way the four bookkeeping records are resolved.

use std::sync::Arc;

use opsdesk_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{customer_records, pricing_models};
use crate::models::CatalogCache;
use crate::numeric::blob::{decode_weights, encode_weights};
use crate::numeric::regression::RegressionEngine;
use crate::training::context::{ModelSnapshot, StageContext};
use crate::training::plans;

pub async fn run(
    pool: &SqlitePool,
    catalog: Arc<CatalogCache>,
    customer_id: i64,
) -> Result<StageContext> {
    let existing = pricing_models::find_by_customer(pool, customer_id).await?;

    let (model, baseline) = match existing {
        Some(record) => {
            info!(
                customer_id,
                record_id = record.id,
                "model already persisted, skipping baseline fit"
            );
            let (weights, bias) = decode_weights(&record.weights)?;
            (
                ModelSnapshot {
                    record_id: record.id,
                    weights,
                    bias,
                    freshly_trained: false,
                },
                None,
            )
        }
        None => {
            let rows = plans::bootstrap_rows(&catalog);
            let plan = plans::default_plan();
            let outcome = tokio::task::spawn_blocking(move || {
                let mut engine = RegressionEngine::new();
                engine.fit(&plan, &rows)
            })
            .await
            .map_err(|e| Error::Internal(format!("baseline fit task failed: {}", e)))??;

            info!(
                customer_id,
                epochs_run = outcome.epochs_run,
                stop = ?outcome.stop,
                "baseline model fitted"
            );

            let blob = encode_weights(&outcome.weights, outcome.bias);
            let record = pricing_models::insert_with_next_id(pool, customer_id, &blob).await?;
            (
                ModelSnapshot {
                    record_id: record.id,
                    weights: outcome.weights.clone(),
                    bias: outcome.bias,
                    freshly_trained: true,
                },
                Some(outcome),
            )
        }
    };

    let order = customer_records::get_or_create_order(pool, customer_id).await?;
    let operation = customer_records::get_or_create_operation(pool, customer_id).await?;
    let qa_review = customer_records::get_or_create_qa_review(pool, customer_id).await?;
    let intake = customer_records::get_or_create_intake(pool, customer_id, &catalog).await?;

    Ok(StageContext {
        customer_id,
        model,
        order,
        operation,
        qa_review,
        intake,
        catalog,
        baseline,
    })
}
