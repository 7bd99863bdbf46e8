//! Persisted per-customer record types
//!
//! One pricing model row per customer plus the four scaffold records the
//! bootstrap stage guarantees exist (order, operation, QA review, intake).
//! Scaffold fields stay mostly unset at creation; later pipelines fill
//! them in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trained pricing model for one customer
///
/// `weights` holds the serialized baseline fit, see `numeric::blob` for
/// the layout. Row ids are assigned as max-plus-one inside a single
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingModel {
    pub id: i64,
    pub customer_id: i64,
    pub weights: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Placeholder order record created alongside a new pricing model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub id: i64,
    pub customer_id: i64,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Placeholder operations record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerOperation {
    pub id: i64,
    pub customer_id: i64,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Placeholder QA review record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReview {
    pub id: i64,
    pub customer_id: i64,
    pub verdict: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Operations intake record
///
/// Carries up to three sub-product and three sub-service references the
/// branch stages work from. A fresh record points at the first catalog
/// rows of each kind; slots are `None` when fewer exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: i64,
    pub customer_id: i64,
    pub sub_products: [Option<i64>; 3],
    pub sub_services: [Option<i64>; 3],
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}
