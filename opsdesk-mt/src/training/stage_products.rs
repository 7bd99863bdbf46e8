//! Products branch: quality-metric statistics plus an independent fit
//!
//! Runs concurrently with the services branch against its own engine
//! and ledger. Failures are logged here with stage attribution before
//! propagating to the orchestrator.

use opsdesk_common::events::StageName;
use opsdesk_common::{Error, Result};
use tracing::{error, info};

use crate::models::ClusterReport;
use crate::numeric::clustering::{kmeans_1d, median, ClusterVector};
use crate::numeric::regression::FitOutcome;
use crate::training::context::StageContext;
use crate::training::ledger::BranchLedger;
use crate::training::plans;
use crate::training::registry::SharedEngine;

pub struct ProductsOutput {
    pub cluster: ClusterReport,
    pub fit: FitOutcome,
    pub ledger: BranchLedger,
}

pub async fn run(context: &StageContext, engine: SharedEngine) -> Result<ProductsOutput> {
    match execute(context, engine).await {
        Ok(output) => Ok(output),
        Err(e) => {
            error!(
                stage = %StageName::Products,
                customer_id = context.customer_id,
                "branch failed: {}",
                e
            );
            Err(e)
        }
    }
}

async fn execute(context: &StageContext, engine: SharedEngine) -> Result<ProductsOutput> {
    let referenced = context.catalog.products_matching(&context.intake.sub_products);
    let samples: Vec<f64> = referenced
        .iter()
        .filter_map(|item| item.secondary_metric)
        .collect();
    if samples.is_empty() {
        return Err(Error::InvalidInput(
            "no quality metrics among referenced sub-products".to_string(),
        ));
    }

    let sample_median = median(&samples)?;
    let centroids = kmeans_1d(&samples, plans::KMEANS_CLUSTERS, plans::KMEANS_MAX_ITERATIONS)?;
    let vector = ClusterVector::from_centroids(&centroids)?;

    info!(
        customer_id = context.customer_id,
        samples = samples.len(),
        median = sample_median,
        magnitude = vector.magnitude,
        "quality metrics condensed"
    );

    let rows = plans::fixed_rows(&plans::PRODUCTS_BRANCH_PRICES, plans::PRODUCTS_ONE_HOT_OFFSET);
    let plan = plans::default_plan();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = engine
            .lock()
            .map_err(|_| Error::Internal("products engine mutex poisoned".to_string()))?;
        engine.fit(&plan, &rows)
    })
    .await
    .map_err(|e| Error::Internal(format!("products fit task failed: {}", e)))??;

    let mut ledger = BranchLedger::new();
    ledger.record_fit(&outcome);

    let cluster = ClusterReport {
        sample_count: samples.len(),
        median: sample_median,
        components: vector.components,
        magnitude: vector.magnitude,
        direction: vector.direction,
    };

    Ok(ProductsOutput {
        cluster,
        fit: outcome,
        ledger,
    })
}
