//! Data models for opsdesk-mt

pub mod catalog;
pub mod records;
pub mod run;
pub mod summary;

pub use catalog::{CatalogCache, CatalogItem, CatalogKind};
pub use records::{CustomerOperation, CustomerOrder, IntakeRecord, PricingModel, QaReview};
pub use run::{RunState, StateTransition, TrainingRun};
pub use summary::{ClusterReport, FitReport, TrainingRunSummary};
