//! OpsDesk Model Trainer
//!
//! Per-customer price-model training over the shared operations
//! database. Each request runs a four-stage pipeline: a bootstrap stage
//! that resolves the customer's model and bookkeeping records, two
//! concurrent branch fits, and a finalize fit over both branch results.
//! Exposed over HTTP on port 5727.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod numeric;
pub mod training;

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use opsdesk_common::events::EventBus;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

pub use error::{ApiError, ApiResult};

use models::CatalogCache;
use training::registry::EngineRegistry;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    /// Connection pool over the service database
    pub db: SqlitePool,
    /// Broadcast bus feeding the SSE endpoint
    pub event_bus: EventBus,
    /// Catalog rows, loaded once at startup
    pub catalog: Arc<CatalogCache>,
    /// Per-session regression engine registry
    pub engines: EngineRegistry,
    /// Startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
    /// Most recent run fault, surfaced by the health probe
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, catalog: Arc<CatalogCache>) -> Self {
        Self {
            db,
            event_bus,
            catalog,
            engines: EngineRegistry::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Builds the service router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::training_routes())
        .merge(api::model_routes())
        .merge(api::events_routes())
        .with_state(state)
}
