//! Per-run execution context.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use socialflow_types::{StepResult, TypeTag};

/// Mutable state accumulated over one workflow run.
///
/// The context is owned exclusively by the runner for the lifetime of a run
/// and is never handed to capability code; capabilities only ever receive
/// their resolved argument values. The single `previous_output` slot is the
/// whole data-flow model: each completed step overwrites it, and the next
/// step's bindings read it.
#[derive(Debug)]
pub struct ExecutionContext {
    /// Workflow this context belongs to.
    pub workflow_id: String,
    /// When the run began.
    pub start_time: DateTime<Utc>,
    /// Raw output of the most recently completed step.
    pub previous_output: Option<Value>,
    /// Declared return type tag of the most recently completed step.
    pub previous_output_type: TypeTag,
    /// Results of every attempted step so far, in execution order.
    pub step_results: IndexMap<String, StepResult>,
}

impl ExecutionContext {
    /// Fresh context with no previous output.
    pub fn new(workflow_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            start_time,
            previous_output: None,
            previous_output_type: TypeTag::Null,
            step_results: IndexMap::new(),
        }
    }

    /// Record a completed step and advance the data-flow slot to its output.
    pub fn record_completed(&mut self, result: StepResult, return_type: &TypeTag) {
        self.previous_output = result.output.clone();
        self.previous_output_type = return_type.clone();
        self.step_results.insert(result.step_id.clone(), result);
    }

    /// Record a failed step. The data-flow slot is left untouched; the runner
    /// terminates the loop immediately after.
    pub fn record_failed(&mut self, result: StepResult) {
        self.step_results.insert(result.step_id.clone(), result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use socialflow_types::{StepMetrics, StepStatus};

    fn completed(step_id: &str, output: Value) -> StepResult {
        StepResult {
            step_id: step_id.to_string(),
            status: StepStatus::Completed,
            start_time: Utc::now(),
            end_time: Utc::now(),
            output: Some(output),
            error: None,
            metrics: StepMetrics::default(),
        }
    }

    #[test]
    fn completed_steps_advance_the_data_flow_slot() {
        let mut context = ExecutionContext::new("wf-1", Utc::now());
        assert!(context.previous_output.is_none());
        assert!(context.previous_output_type.is_null());

        context.record_completed(completed("s1", json!(["a", "b"])), &TypeTag::Sequence(None));
        assert_eq!(context.previous_output, Some(json!(["a", "b"])));
        assert_eq!(context.previous_output_type, TypeTag::Sequence(None));

        context.record_completed(completed("s2", json!("summary")), &TypeTag::String);
        assert_eq!(context.previous_output, Some(json!("summary")));
        assert_eq!(context.previous_output_type, TypeTag::String);
        assert_eq!(context.step_results.len(), 2);
    }

    #[test]
    fn failed_steps_keep_the_previous_output() {
        let mut context = ExecutionContext::new("wf-1", Utc::now());
        context.record_completed(completed("s1", json!(42)), &TypeTag::Integer);

        let failed = StepResult {
            step_id: "s2".to_string(),
            status: StepStatus::Failed,
            start_time: Utc::now(),
            end_time: Utc::now(),
            output: None,
            error: None,
            metrics: StepMetrics::default(),
        };
        context.record_failed(failed);

        assert_eq!(context.previous_output, Some(json!(42)));
        assert_eq!(context.previous_output_type, TypeTag::Integer);
        assert_eq!(context.step_results.len(), 2);
    }
}
