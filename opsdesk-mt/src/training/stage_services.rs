//! Services branch: independent fit over the service price band
//!
//! Mirrors the products branch with its own engine and ledger, a
//! shifted one-hot encoding, and no clustering step.

use opsdesk_common::events::StageName;
use opsdesk_common::{Error, Result};
use tracing::{error, info};

use crate::numeric::regression::FitOutcome;
use crate::training::context::StageContext;
use crate::training::ledger::BranchLedger;
use crate::training::plans;
use crate::training::registry::SharedEngine;

pub struct ServicesOutput {
    pub fit: FitOutcome,
    pub ledger: BranchLedger,
}

pub async fn run(context: &StageContext, engine: SharedEngine) -> Result<ServicesOutput> {
    match execute(context, engine).await {
        Ok(output) => Ok(output),
        Err(e) => {
            error!(
                stage = %StageName::Services,
                customer_id = context.customer_id,
                "branch failed: {}",
                e
            );
            Err(e)
        }
    }
}

async fn execute(context: &StageContext, engine: SharedEngine) -> Result<ServicesOutput> {
    let referenced = context.catalog.services_matching(&context.intake.sub_services);
    info!(
        customer_id = context.customer_id,
        referenced = referenced.len(),
        "services branch starting"
    );

    let rows = plans::fixed_rows(&plans::SERVICES_BRANCH_PRICES, plans::SERVICES_ONE_HOT_OFFSET);
    let plan = plans::default_plan();
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = engine
            .lock()
            .map_err(|_| Error::Internal("services engine mutex poisoned".to_string()))?;
        engine.fit(&plan, &rows)
    })
    .await
    .map_err(|e| Error::Internal(format!("services fit task failed: {}", e)))??;

    let mut ledger = BranchLedger::new();
    ledger.record_fit(&outcome);

    Ok(ServicesOutput {
        fit: outcome,
        ledger,
    })
}
