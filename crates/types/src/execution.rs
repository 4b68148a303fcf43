//! Execution result schema and the progress events the runner emits.
//!
//! One workflow run produces a stream of [`RunEvent`]s (a started/finished
//! pair per attempted step, then one final event carrying the complete
//! [`ExecutionResult`]) plus the result itself. Results are immutable once
//! the run reaches a terminal state; completed steps stay available in
//! `step_results` for diagnostics even when the run as a whole failed.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire-level error codes attached to [`ExecutionError`]s.
pub mod error_code {
    /// Pre-flight failure: the planner reported unresolved first-step parameters.
    pub const MISSING_PARAMETERS: &str = "MISSING_PARAMETERS";
    /// A step's parameters could not be resolved from context.
    pub const BINDING_RESOLUTION_ERROR: &str = "BINDING_RESOLUTION_ERROR";
    /// The named capability is not registered.
    pub const CAPABILITY_NOT_FOUND: &str = "CAPABILITY_NOT_FOUND";
    /// The capability does not expose the named operation.
    pub const OPERATION_NOT_FOUND: &str = "OPERATION_NOT_FOUND";
    /// The underlying capability call raised.
    pub const CAPABILITY_INVOCATION_ERROR: &str = "CAPABILITY_INVOCATION_ERROR";
}

/// Terminal status of a single step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Step executed and returned a value.
    Completed,
    /// Step could not resolve its inputs or the call raised.
    Failed,
    /// Step never ran (reserved; the sequential loop fails fast instead).
    Skipped,
}

/// Overall status of a workflow run.
///
/// `Paused` and `Cancelled` are representable for future suspension support
/// but are never produced by the sequential runner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Every step ran and succeeded.
    Completed,
    /// Pre-flight rejected the run or some step failed.
    Failed,
    /// Reserved.
    Paused,
    /// Reserved.
    Cancelled,
}

/// Per-step resource accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock duration of the step in milliseconds.
    pub duration_ms: u64,
    /// Capability invocations performed (1 per executed step).
    pub api_calls: u32,
    /// Serialized size of the step output, as a processing proxy.
    pub data_processed_bytes: u64,
}

/// Structured error detail attached to step results and the run error list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Stable machine-readable code (see [`error_code`]).
    pub error_code: String,
    /// Human-readable message.
    pub message: String,
    /// Step the error belongs to, absent for pre-flight failures.
    #[serde(default)]
    pub step_id: Option<String>,
    /// When the error was recorded.
    pub timestamp: DateTime<Utc>,
    /// Whether the caller can fix the condition and resubmit (true only for
    /// missing-parameter pre-flight failures).
    #[serde(default)]
    pub recoverable: bool,
    /// Free-form structured context (wrapped source error, planner lists).
    #[serde(default)]
    pub details: Value,
}

impl ExecutionError {
    /// Build an error with the current timestamp and no step attribution.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            step_id: None,
            timestamp: Utc::now(),
            recoverable: false,
            details: Value::Null,
        }
    }

    /// Attach the owning step.
    pub fn for_step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    /// Attach structured context.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Mark the error as recoverable by the caller.
    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Step identifier.
    pub step_id: String,
    /// Terminal step status.
    pub status: StepStatus,
    /// When the step began.
    pub start_time: DateTime<Utc>,
    /// When the step reached its terminal status.
    pub end_time: DateTime<Utc>,
    /// Value produced by the capability; present only when `Completed`.
    #[serde(default)]
    pub output: Option<Value>,
    /// Failure detail; present only when `Failed`.
    #[serde(default)]
    pub error: Option<ExecutionError>,
    /// Resource accounting for the step.
    #[serde(default)]
    pub metrics: StepMetrics,
}

/// Aggregate resource accounting for a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionMetrics {
    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration_ms: u64,
    /// Per-step durations keyed by step id, in execution order.
    pub step_durations: IndexMap<String, u64>,
    /// Total capability invocations.
    pub api_calls: u32,
    /// Total serialized output size across completed steps.
    pub data_processed_bytes: u64,
}

/// Immutable record of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Workflow the run executed.
    pub workflow_id: String,
    /// Terminal run status.
    pub status: RunStatus,
    /// When the run began.
    pub start_time: DateTime<Utc>,
    /// When the run reached its terminal status.
    pub end_time: DateTime<Utc>,
    /// Outcome of every attempted step, keyed by step id in execution order.
    #[serde(default)]
    pub step_results: IndexMap<String, StepResult>,
    /// Outputs of all completed steps, keyed by step id.
    #[serde(default)]
    pub outputs: IndexMap<String, Value>,
    /// Workflow-level error list; empty exactly when `status` is `Completed`.
    #[serde(default)]
    pub errors: Vec<ExecutionError>,
    /// Aggregate resource accounting.
    #[serde(default)]
    pub metrics: ExecutionMetrics,
}

/// Progress events emitted over the run's event channel, in strict step
/// order. A run of `k` attempted steps emits exactly `2k + 1` events; the
/// final [`RunEvent::RunCompleted`] is always last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A step is about to execute.
    StepStarted {
        /// Zero-based position of the step in the plan.
        index: usize,
        /// Step identifier.
        step_id: String,
        /// Planner-authored intent, for display.
        description: String,
        /// When execution of the step began.
        started_at: DateTime<Utc>,
    },
    /// A step reached a terminal status.
    StepFinished {
        /// Step identifier.
        step_id: String,
        /// Terminal step status.
        status: StepStatus,
        /// Output value when the step completed.
        #[serde(default)]
        output: Option<Value>,
        /// Failure detail when the step failed.
        #[serde(default)]
        error: Option<ExecutionError>,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },
    /// The run reached a terminal state; always the last event.
    RunCompleted {
        /// The complete, immutable result of the run.
        result: ExecutionResult,
    },
}
