//! Event types and broadcast bus for the OpsDesk event system.
//!
//! Provides shared event definitions and the EventBus all OpsDesk modules
//! use to publish pipeline progress for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Training pipeline stages, in execution order.
///
/// Bootstrap runs alone, Products and Services run concurrently,
/// Finalize runs after both branches have joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageName {
    Bootstrap,
    Products,
    Services,
    Finalize,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageName::Bootstrap => write!(f, "Bootstrap"),
            StageName::Products => write!(f, "Products"),
            StageName::Services => write!(f, "Services"),
            StageName::Finalize => write!(f, "Finalize"),
        }
    }
}

/// OpsDesk event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OpsdeskEvent {
    /// A training run was accepted and assigned a session id
    TrainingRunStarted {
        session_id: i64,
        customer_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage began executing
    StageStarted {
        session_id: i64,
        stage: StageName,
        timestamp: DateTime<Utc>,
    },

    /// A pipeline stage finished successfully
    StageCompleted {
        session_id: i64,
        stage: StageName,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run state machine moved to a new state
    RunStateChanged {
        session_id: i64,
        state: String,
        timestamp: DateTime<Utc>,
    },

    /// The whole run completed and a summary was returned to the caller
    TrainingRunCompleted {
        session_id: i64,
        customer_id: i64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The run aborted; `stage` is where the fault surfaced
    TrainingRunFailed {
        session_id: i64,
        stage: StageName,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl OpsdeskEvent {
    /// Returns the event type name, matching the serialized `type` tag
    pub fn event_type(&self) -> &str {
        match self {
            OpsdeskEvent::TrainingRunStarted { .. } => "TrainingRunStarted",
            OpsdeskEvent::StageStarted { .. } => "StageStarted",
            OpsdeskEvent::StageCompleted { .. } => "StageCompleted",
            OpsdeskEvent::RunStateChanged { .. } => "RunStateChanged",
            OpsdeskEvent::TrainingRunCompleted { .. } => "TrainingRunCompleted",
            OpsdeskEvent::TrainingRunFailed { .. } => "TrainingRunFailed",
        }
    }
}

/// Broadcast bus for OpsDesk events
///
/// Wraps tokio::broadcast, providing:
/// - Multiple-subscriber fan-out with per-subscriber cursors
/// - Bounded buffering (old events dropped when a subscriber lags)
/// - Cheap cloning (subscribers attach to the same sender)
///
/// # Examples
///
/// ```
/// use opsdesk_common::events::EventBus;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OpsdeskEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start losing the oldest ones. Services use 100; tests use 10.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<OpsdeskEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: OpsdeskEvent,
    ) -> Result<usize, broadcast::error::SendError<OpsdeskEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Progress events use this; a run must not fail because the SSE
    /// stream has no clients.
    pub fn emit_lossy(&self, event: OpsdeskEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
