//! Typed per-run context produced by the bootstrap stage

use std::sync::Arc;

use crate::models::{CatalogCache, CustomerOperation, CustomerOrder, IntakeRecord, QaReview};
use crate::numeric::regression::FitOutcome;

/// Decoded view of the customer's persisted model
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub record_id: i64,
    pub weights: Vec<f32>,
    pub bias: f32,
    /// False when the row predated this run
    pub freshly_trained: bool,
}

/// Everything the bootstrap stage resolves for one run
///
/// Later stages receive this by shared reference. Nothing in it mutates
/// after bootstrap, which lets both branches read it concurrently
/// without coordination.
#[derive(Debug)]
pub struct StageContext {
    pub customer_id: i64,
    pub model: ModelSnapshot,
    pub order: CustomerOrder,
    pub operation: CustomerOperation,
    pub qa_review: QaReview,
    pub intake: IntakeRecord,
    pub catalog: Arc<CatalogCache>,
    /// Present only when bootstrap actually trained this run
    pub baseline: Option<FitOutcome>,
}
