//! Training run state machine
//!
//! A run progresses through
//! CREATED → BOOTSTRAP_RUNNING → BOOTSTRAP_DONE → BRANCHES_RUNNING →
//! BRANCHES_DONE → FINALIZE_RUNNING → COMPLETED,
//! and any state can drop straight to FAULTED. Both terminal states are
//! followed by engine release in the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Training run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Session allocated, nothing executed yet
    Created,
    /// Bootstrap stage executing (pricing model + scaffold records)
    BootstrapRunning,
    /// Bootstrap finished, context populated
    BootstrapDone,
    /// Products and Services branches executing concurrently
    BranchesRunning,
    /// Both branches joined successfully
    BranchesDone,
    /// Final fit executing
    FinalizeRunning,
    /// Run finished successfully
    Completed,
    /// Run aborted by a stage fault
    Faulted,
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: i64,
    pub old_state: RunState,
    pub new_state: RunState,
    pub transitioned_at: DateTime<Utc>,
}

/// One orchestration run (in-memory state)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRun {
    /// Session identifier, unique across concurrent runs
    pub session_id: i64,

    /// Customer the pipeline executes for
    pub customer_id: i64,

    /// Current state
    pub state: RunState,

    /// Every transition taken, in order
    pub transitions: Vec<StateTransition>,

    /// Run start time
    pub started_at: DateTime<Utc>,

    /// Run end time (set when a terminal state is entered)
    pub ended_at: Option<DateTime<Utc>>,
}

impl TrainingRun {
    /// Create a new run in the Created state
    pub fn new(session_id: i64, customer_id: i64) -> Self {
        Self {
            session_id,
            customer_id,
            state: RunState::Created,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, recording the step
    pub fn transition_to(&mut self, new_state: RunState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.transitions.push(transition.clone());

        // Set end time for terminal states
        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    /// Whether the run reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Completed | RunState::Faulted)
    }
}
