//! Four-stage training pipeline
//!
//! Bootstrap runs alone, the products and services branches run
//! concurrently and are joined, then finalize combines their results.
//! Any stage failure faults the run as a whole; work persisted by
//! earlier stages is not rolled back. The engine pair claimed at the
//! start is released on every exit path by the orchestrator itself,
//! never from inside a stage.

pub mod context;
pub mod ledger;
pub mod plans;
pub mod registry;
pub mod stage_bootstrap;
pub mod stage_finalize;
pub mod stage_products;
pub mod stage_services;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use opsdesk_common::events::{EventBus, OpsdeskEvent, StageName};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::models::{CatalogCache, FitReport, RunState, TrainingRun, TrainingRunSummary};
use crate::training::registry::{EnginePair, EngineRegistry};

pub struct TrainingOrchestrator {
    db: SqlitePool,
    catalog: Arc<CatalogCache>,
    registry: EngineRegistry,
    event_bus: EventBus,
}

impl TrainingOrchestrator {
    pub fn new(
        db: SqlitePool,
        catalog: Arc<CatalogCache>,
        registry: EngineRegistry,
        event_bus: EventBus,
    ) -> Self {
        Self {
            db,
            catalog,
            registry,
            event_bus,
        }
    }

    /// Runs the full pipeline for one request.
    pub async fn run(
        &self,
        item_id: i64,
        name: &str,
        customer_id: i64,
    ) -> anyhow::Result<TrainingRunSummary> {
        let started = Instant::now();
        let session_id = self.registry.allocate_session_id();
        let pair = self.registry.register_pair(session_id).await;
        let mut run = TrainingRun::new(session_id, customer_id);

        self.event_bus.emit_lossy(OpsdeskEvent::TrainingRunStarted {
            session_id,
            customer_id,
            timestamp: Utc::now(),
        });
        info!(session_id, customer_id, item_id, "training run starting");

        let result = self
            .execute_pipeline(&mut run, &pair, item_id, name, customer_id, started)
            .await;

        // The terminal transition happens before the engines go away
        match result {
            Ok(summary) => {
                self.registry.release_pair(session_id).await;
                self.event_bus.emit_lossy(OpsdeskEvent::TrainingRunCompleted {
                    session_id,
                    customer_id,
                    duration_ms: summary.duration_ms,
                    timestamp: Utc::now(),
                });
                info!(
                    session_id,
                    duration_ms = summary.duration_ms,
                    "training run completed"
                );
                Ok(summary)
            }
            Err((stage, e)) => {
                self.transition(&mut run, RunState::Faulted);
                self.registry.release_pair(session_id).await;
                self.event_bus.emit_lossy(OpsdeskEvent::TrainingRunFailed {
                    session_id,
                    stage,
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                error!(session_id, stage = %stage, "training run faulted: {:#}", e);
                Err(e.context(format!("{} stage failed", stage)))
            }
        }
    }

    async fn execute_pipeline(
        &self,
        run: &mut TrainingRun,
        pair: &EnginePair,
        item_id: i64,
        name: &str,
        customer_id: i64,
        started: Instant,
    ) -> Result<TrainingRunSummary, (StageName, anyhow::Error)> {
        let session_id = run.session_id;

        self.transition(run, RunState::BootstrapRunning);
        self.emit_stage_started(session_id, StageName::Bootstrap);
        let stage_started = Instant::now();
        let context = stage_bootstrap::run(&self.db, self.catalog.clone(), customer_id)
            .await
            .map_err(|e| (StageName::Bootstrap, anyhow::Error::from(e)))?;
        self.emit_stage_completed(session_id, StageName::Bootstrap, stage_started);
        self.transition(run, RunState::BootstrapDone);

        let context = Arc::new(context);

        self.transition(run, RunState::BranchesRunning);
        self.emit_stage_started(session_id, StageName::Products);
        self.emit_stage_started(session_id, StageName::Services);
        let branches_started = Instant::now();

        let products_context = context.clone();
        let products_engine = pair.products_engine.clone();
        let products_task = tokio::spawn(async move {
            stage_products::run(&products_context, products_engine).await
        });

        let services_context = context.clone();
        let services_engine = pair.services_engine.clone();
        let services_task = tokio::spawn(async move {
            stage_services::run(&services_context, services_engine).await
        });

        // Join barrier: both branches finish before either error is acted on
        let (products_result, services_result) = tokio::join!(products_task, services_task);
        let products = flatten_join(products_result).map_err(|e| (StageName::Products, e))?;
        let services = flatten_join(services_result).map_err(|e| (StageName::Services, e))?;

        self.emit_stage_completed(session_id, StageName::Products, branches_started);
        self.emit_stage_completed(session_id, StageName::Services, branches_started);
        self.transition(run, RunState::BranchesDone);

        self.transition(run, RunState::FinalizeRunning);
        self.emit_stage_started(session_id, StageName::Finalize);
        let stage_started = Instant::now();
        let finalize = stage_finalize::run(&context, &products, &services)
            .await
            .map_err(|e| (StageName::Finalize, anyhow::Error::from(e)))?;
        self.emit_stage_completed(session_id, StageName::Finalize, stage_started);
        self.transition(run, RunState::Completed);

        Ok(TrainingRunSummary {
            session_id,
            item_id,
            name: name.to_string(),
            customer_id,
            model_record_id: context.model.record_id,
            freshly_trained: context.model.freshly_trained,
            baseline: context.baseline.as_ref().map(FitReport::from),
            cluster: products.cluster,
            products_fit: FitReport::from(&products.fit),
            services_fit: FitReport::from(&services.fit),
            final_fit: FitReport::from(&finalize.fit),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn transition(&self, run: &mut TrainingRun, new_state: RunState) {
        let change = run.transition_to(new_state);
        self.event_bus.emit_lossy(OpsdeskEvent::RunStateChanged {
            session_id: run.session_id,
            state: format!("{:?}", change.new_state),
            timestamp: Utc::now(),
        });
    }

    fn emit_stage_started(&self, session_id: i64, stage: StageName) {
        self.event_bus.emit_lossy(OpsdeskEvent::StageStarted {
            session_id,
            stage,
            timestamp: Utc::now(),
        });
    }

    fn emit_stage_completed(&self, session_id: i64, stage: StageName, started: Instant) {
        self.event_bus.emit_lossy(OpsdeskEvent::StageCompleted {
            session_id,
            stage,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });
    }
}

fn flatten_join<T>(
    result: Result<opsdesk_common::Result<T>, tokio::task::JoinError>,
) -> anyhow::Result<T> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(anyhow::Error::from(e).context("branch task did not finish")),
    }
}
