//! Response types for a completed training run

use serde::{Deserialize, Serialize};

use crate::numeric::regression::{FitOutcome, StopReason};

/// Condensed view of one fit, safe to serialize
///
/// `final_loss` is omitted when the recorded loss is non-finite (a
/// divergent fit), since JSON cannot carry NaN or infinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub epochs_run: usize,
    pub stop: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_loss: Option<f32>,
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl From<&FitOutcome> for FitReport {
    fn from(outcome: &FitOutcome) -> Self {
        Self {
            epochs_run: outcome.epochs_run,
            stop: outcome.stop,
            final_loss: outcome.losses.last().copied().filter(|l| l.is_finite()),
            weights: outcome.weights.clone(),
            bias: outcome.bias,
        }
    }
}

/// Quality-metric statistics computed by the products branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub sample_count: usize,
    pub median: f64,
    pub components: [f64; 3],
    pub magnitude: f64,
    pub direction: [f64; 3],
}

/// Aggregate returned to the caller after all four stages finish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRunSummary {
    pub session_id: i64,
    pub item_id: i64,
    pub name: String,
    pub customer_id: i64,
    pub model_record_id: i64,
    /// False when a persisted model already existed for the customer
    pub freshly_trained: bool,
    /// Present only when the bootstrap stage actually trained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<FitReport>,
    pub cluster: ClusterReport,
    pub products_fit: FitReport,
    pub services_fit: FitReport,
    pub final_fit: FitReport,
    pub duration_ms: u64,
}
