//! Sequential workflow runner that streams lifecycle events.
//!
//! The runner drives a workflow's steps strictly in declared order, one at a
//! time. Each step goes through the binding resolver and then the capability
//! invoker; the first failure terminates the loop (fail-fast), and the run
//! always finishes with a well-formed [`ExecutionResult`]: errors never
//! escape the loop. Progress is reported over a Tokio channel owned by the
//! caller: one started/finished event pair per attempted step, then a final
//! event carrying the result, in strict step order.

use std::{sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Value, json};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{info, warn};

use socialflow_types::{
    ExecutionError, ExecutionMetrics, ExecutionResult, ParameterValidationResult, RunEvent, RunStatus, StepMetrics, StepResult,
    StepStatus, WorkflowDefinition, WorkflowStep, error_code,
};

use crate::{
    context::ExecutionContext,
    invoker::{CapabilityInvoker, StepError},
    resolve::resolve_step_arguments,
};

/// Drives workflow runs against a shared capability invoker.
///
/// A runner is cheap to clone per run; distinct runs share nothing but the
/// read-only registry behind the invoker.
pub struct WorkflowRunner {
    invoker: Arc<CapabilityInvoker>,
}

impl WorkflowRunner {
    /// Build a runner over an explicit invoker (no ambient configuration).
    pub fn new(invoker: Arc<CapabilityInvoker>) -> Self {
        Self { invoker }
    }

    /// Execute the workflow, emitting progress events into `event_tx`.
    ///
    /// Event delivery is best-effort: a dropped receiver never aborts the
    /// run. The returned result is identical to the one carried by the final
    /// [`RunEvent::RunCompleted`] event.
    pub async fn drive(
        &self,
        workflow: &WorkflowDefinition,
        validation: &ParameterValidationResult,
        event_tx: &UnboundedSender<RunEvent>,
    ) -> ExecutionResult {
        let start_time = Utc::now();
        let run_timer = Instant::now();
        info!(workflow = %workflow.workflow_id, steps = workflow.steps.len(), "executing workflow");

        if !validation.is_consistent() {
            warn!(
                workflow = %workflow.workflow_id,
                "validation report claims validity despite findings; trusting is_valid"
            );
        }
        if !validation.is_valid {
            warn!(workflow = %workflow.workflow_id, "missing required parameters; refusing to execute");
            let result = preflight_failure(workflow, validation, start_time);
            let _ = event_tx.send(RunEvent::RunCompleted { result: result.clone() });
            return result;
        }

        let mut context = ExecutionContext::new(workflow.workflow_id.clone(), start_time);
        let mut errors: Vec<ExecutionError> = Vec::new();

        for (index, step) in workflow.steps.iter().enumerate() {
            let step_started_at = Utc::now();
            let step_timer = Instant::now();
            let _ = event_tx.send(RunEvent::StepStarted {
                index,
                step_id: step.step_id.clone(),
                description: step.description.clone(),
                started_at: step_started_at,
            });
            info!(
                step = %step.step_id,
                position = index + 1,
                total = workflow.steps.len(),
                operation = %format!("{}.{}", step.capability_id, step.operation_id),
                "executing step"
            );

            let outcome = self.run_step(step, &context, index).await;
            let duration_ms = elapsed_ms(&step_timer);
            let step_ended_at = Utc::now();

            match outcome {
                Ok(output) => {
                    let result = StepResult {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Completed,
                        start_time: step_started_at,
                        end_time: step_ended_at,
                        output: Some(output.clone()),
                        error: None,
                        metrics: StepMetrics {
                            duration_ms,
                            api_calls: 1,
                            data_processed_bytes: serialized_size(&output),
                        },
                    };
                    context.record_completed(result, &step.return_type);
                    let _ = event_tx.send(RunEvent::StepFinished {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Completed,
                        output: Some(output),
                        error: None,
                        duration_ms,
                    });
                }
                Err(step_error) => {
                    warn!(step = %step.step_id, error = %step_error, "step failed; terminating run");
                    let execution_error = step_error.into_execution_error(&step.step_id);
                    errors.push(execution_error.clone());
                    let result = StepResult {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Failed,
                        start_time: step_started_at,
                        end_time: step_ended_at,
                        output: None,
                        error: Some(execution_error.clone()),
                        metrics: StepMetrics {
                            duration_ms,
                            api_calls: 0,
                            data_processed_bytes: 0,
                        },
                    };
                    context.record_failed(result);
                    let _ = event_tx.send(RunEvent::StepFinished {
                        step_id: step.step_id.clone(),
                        status: StepStatus::Failed,
                        output: None,
                        error: Some(execution_error),
                        duration_ms,
                    });
                    break;
                }
            }
        }

        let result = finalize(context, errors, run_timer);
        info!(
            workflow = %result.workflow_id,
            status = ?result.status,
            steps_run = result.step_results.len(),
            "workflow finished"
        );
        let _ = event_tx.send(RunEvent::RunCompleted { result: result.clone() });
        result
    }

    /// Execute the workflow without observing progress events.
    pub async fn execute(&self, workflow: &WorkflowDefinition, validation: &ParameterValidationResult) -> ExecutionResult {
        let (event_tx, event_rx) = unbounded_channel();
        drop(event_rx);
        self.drive(workflow, validation, &event_tx).await
    }

    async fn run_step(&self, step: &WorkflowStep, context: &ExecutionContext, index: usize) -> Result<Value, StepError> {
        let arguments = resolve_step_arguments(step, context, index);
        if arguments.is_empty() {
            return Err(StepError::BindingResolution {
                step_id: step.step_id.clone(),
                reason: binding_failure_reason(index),
            });
        }
        self.invoker.invoke(&step.capability_id, &step.operation_id, arguments).await
    }
}

fn binding_failure_reason(step_index: usize) -> String {
    if step_index == 0 {
        "required parameters have no literal values".to_string()
    } else {
        "no declared parameter accepts the previous step's output".to_string()
    }
}

fn preflight_failure(
    workflow: &WorkflowDefinition,
    validation: &ParameterValidationResult,
    start_time: DateTime<Utc>,
) -> ExecutionResult {
    let details = json!({
        "missing_required_parameters": validation.missing_required_parameters,
        "parameter_conflicts": validation.parameter_conflicts,
    });
    let error = ExecutionError::new(error_code::MISSING_PARAMETERS, "cannot execute workflow due to missing parameters")
        .with_details(details)
        .recoverable();

    ExecutionResult {
        workflow_id: workflow.workflow_id.clone(),
        status: RunStatus::Failed,
        start_time,
        end_time: Utc::now(),
        step_results: IndexMap::new(),
        outputs: IndexMap::new(),
        errors: vec![error],
        metrics: ExecutionMetrics::default(),
    }
}

fn finalize(context: ExecutionContext, errors: Vec<ExecutionError>, run_timer: Instant) -> ExecutionResult {
    let mut outputs = IndexMap::new();
    let mut step_durations = IndexMap::new();
    let mut api_calls = 0u32;
    let mut data_processed_bytes = 0u64;

    for (step_id, result) in &context.step_results {
        step_durations.insert(step_id.clone(), result.metrics.duration_ms);
        api_calls += result.metrics.api_calls;
        data_processed_bytes += result.metrics.data_processed_bytes;
        if result.status == StepStatus::Completed
            && let Some(output) = &result.output
        {
            outputs.insert(step_id.clone(), output.clone());
        }
    }

    let status = if errors.is_empty() { RunStatus::Completed } else { RunStatus::Failed };

    ExecutionResult {
        workflow_id: context.workflow_id,
        status,
        start_time: context.start_time,
        end_time: Utc::now(),
        step_results: context.step_results,
        outputs,
        errors,
        metrics: ExecutionMetrics {
            total_duration_ms: elapsed_ms(&run_timer),
            step_durations,
            api_calls,
            data_processed_bytes,
        },
    }
}

fn elapsed_ms(timer: &Instant) -> u64 {
    timer.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

fn serialized_size(value: &Value) -> u64 {
    serde_json::to_vec(value).map(|bytes| bytes.len() as u64).unwrap_or(0)
}
