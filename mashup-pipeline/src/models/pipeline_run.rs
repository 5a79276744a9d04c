//! Pipeline run state machine
//!
//! A run progresses through:
//! INIT → SELECTING → ACQUIRING → NORMALIZING → TRIMMING → MERGING → DONE
//!
//! FAILED is reachable from any stage whose output is empty. Nothing here is
//! persisted; the stage directories are the only durable state.

use chrono::{DateTime, Utc};
use mashup_common::RunParameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Pipeline run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    /// Parameters validated, nothing started
    Init,
    /// Search and candidate selection
    Selecting,
    /// Downloads into the raw directory
    Acquiring,
    /// Conversion to the canonical audio format
    Normalizing,
    /// Per-clip duration capping
    Trimming,
    /// Concatenation into the output file
    Merging,
    /// Output written
    Done,
    /// A stage produced nothing usable
    Failed,
}

impl RunState {
    /// Stage that follows this one on the success path
    pub fn next(self) -> Option<RunState> {
        match self {
            RunState::Init => Some(RunState::Selecting),
            RunState::Selecting => Some(RunState::Acquiring),
            RunState::Acquiring => Some(RunState::Normalizing),
            RunState::Normalizing => Some(RunState::Trimming),
            RunState::Trimming => Some(RunState::Merging),
            RunState::Merging => Some(RunState::Done),
            RunState::Done | RunState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "Init",
            RunState::Selecting => "Selecting",
            RunState::Acquiring => "Acquiring",
            RunState::Normalizing => "Normalizing",
            RunState::Trimming => "Trimming",
            RunState::Merging => "Merging",
            RunState::Done => "Done",
            RunState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// State transition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: RunState,
    pub new_state: RunState,
    pub transitioned_at: DateTime<Utc>,
}

/// One pipeline invocation (in-memory only)
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Correlates log lines of one run
    pub run_id: Uuid,

    /// Validated invocation parameters
    pub params: RunParameters,

    /// Current state
    pub state: RunState,

    /// Every transition taken so far, oldest first
    pub transitions: Vec<StateTransition>,

    /// Stage that was active when the run failed
    pub failed_stage: Option<RunState>,

    pub started_at: DateTime<Utc>,

    /// Set once a terminal state is reached
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    /// Create new run in the Init state
    pub fn new(params: RunParameters) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            params,
            state: RunState::Init,
            transitions: Vec::new(),
            failed_stage: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: RunState) -> StateTransition {
        let transition = StateTransition {
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };

        if new_state == RunState::Failed && self.failed_stage.is_none() {
            self.failed_stage = Some(self.state);
        }
        self.state = new_state;
        self.transitions.push(transition.clone());

        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        transition
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Wall-clock seconds since the run started
    pub fn elapsed_seconds(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0)
    }
}
