//! Stored pricing model inspection endpoint

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::pricing_models::find_by_customer;
use crate::error::{ApiError, ApiResult};
use crate::numeric::blob::decode_weights;
use crate::AppState;

/// Decoded view of one customer's stored pricing model
#[derive(Debug, Serialize)]
pub struct PricingModelInfo {
    pub record_id: i64,
    pub customer_id: i64,
    pub weight_count: usize,
    pub bias: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// GET /models/:customer_id
///
/// Decodes the stored weight blob without touching the pipeline.
pub async fn get_model(
    State(state): State<AppState>,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<PricingModelInfo>> {
    let record = find_by_customer(&state.db, customer_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("no pricing model for customer {}", customer_id))
        })?;

    let (weights, bias) = decode_weights(&record.weights)?;

    Ok(Json(PricingModelInfo {
        record_id: record.id,
        customer_id: record.customer_id,
        weight_count: weights.len(),
        bias,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}

pub fn model_routes() -> Router<AppState> {
    Router::new().route("/models/:customer_id", get(get_model))
}
