//! Finalize stage: combined fit after both branches have joined
//!
//! Reads both branch ledgers and runs one more fit over the blended
//! price band with a short-lived local engine. The combined result is
//! computed but deliberately never persisted; it flows only into the
//! response summary.

use opsdesk_common::{Error, Result};
use tracing::{debug, info};

use crate::numeric::regression::{FitOutcome, RegressionEngine};
use crate::training::context::StageContext;
use crate::training::plans;
use crate::training::stage_products::ProductsOutput;
use crate::training::stage_services::ServicesOutput;

pub struct FinalizeOutput {
    pub fit: FitOutcome,
}

pub async fn run(
    context: &StageContext,
    products: &ProductsOutput,
    services: &ServicesOutput,
) -> Result<FinalizeOutput> {
    info!(
        customer_id = context.customer_id,
        products_entries = products.ledger.len(),
        services_entries = services.ledger.len(),
        "combining branch ledgers"
    );

    if let (Some(products_bias), Some(services_bias)) =
        (products.ledger.final_bias(), services.ledger.final_bias())
    {
        debug!(products_bias, services_bias, "branch parameters collected");
    }

    let rows = plans::fixed_rows(&plans::FINAL_FIT_PRICES, plans::FINAL_ONE_HOT_OFFSET);
    let plan = plans::default_plan();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = RegressionEngine::new();
        engine.fit(&plan, &rows)
    })
    .await
    .map_err(|e| Error::Internal(format!("final fit task failed: {}", e)))??;

    info!(
        customer_id = context.customer_id,
        epochs_run = outcome.epochs_run,
        stop = ?outcome.stop,
        "combined model computed, persistence skipped"
    );

    Ok(FinalizeOutput { fit: outcome })
}
