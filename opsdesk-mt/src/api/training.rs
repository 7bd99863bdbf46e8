//! Training run endpoint

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::TrainingRunSummary;
use crate::training::TrainingOrchestrator;
use crate::AppState;

/// POST /training/run/:item_id/:name/:customer_id
///
/// Runs the four-stage pipeline and returns the aggregate of every
/// stage's results. A failed run answers with a single error body;
/// records persisted by earlier stages are not rolled back.
pub async fn run_training(
    State(state): State<AppState>,
    Path((item_id, name, customer_id)): Path<(i64, String, i64)>,
) -> ApiResult<Json<TrainingRunSummary>> {
    if item_id <= 0 || customer_id <= 0 {
        return Err(ApiError::BadRequest(format!(
            "item_id and customer_id must be positive (got {} / {})",
            item_id, customer_id
        )));
    }
    info!(item_id, name = %name, customer_id, "training run requested");

    let orchestrator = TrainingOrchestrator::new(
        state.db.clone(),
        state.catalog.clone(),
        state.engines.clone(),
        state.event_bus.clone(),
    );

    match orchestrator.run(item_id, &name, customer_id).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            *state.last_error.write().await = Some(format!("{:#}", e));
            Err(ApiError::Training(e))
        }
    }
}

pub fn training_routes() -> Router<AppState> {
    Router::new().route("/training/run/:item_id/:name/:customer_id", post(run_training))
}
