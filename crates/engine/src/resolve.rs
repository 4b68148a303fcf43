//! Step parameter binding.
//!
//! For every declared parameter of a step the resolver decides between two
//! sources: the literal value authored by the planner, or the output of the
//! immediately preceding step. Only that single slot of data flows between
//! steps; there are no named inter-step references, so resolution stays
//! O(parameters-per-step).
//!
//! The resolver is a pure function of `(step, context, step_index)`: identical
//! inputs always produce identical argument maps. An empty map is the failure
//! signal: the step cannot run because required inputs are absent.

use indexmap::IndexMap;
use serde_json::Value;
use socialflow_types::{TypeTag, WorkflowStep, is_empty_value};

use crate::context::ExecutionContext;

/// Produce the concrete argument set for a step, or an empty map when the
/// step's required inputs cannot be satisfied.
///
/// First step: every parameter copies its authored literal through, but a
/// required parameter with an empty literal fails resolution outright. The
/// pre-flight validation gate should already have excluded that case; the
/// resolver re-verifies it.
///
/// Later steps: each parameter whose declared type tag accepts the previous
/// step's output is bound to that output; the rest fall back to their
/// literals. If no parameter accepts the previous output at all, the planner
/// and the engine disagree about the data flow and resolution fails.
pub fn resolve_step_arguments(step: &WorkflowStep, context: &ExecutionContext, step_index: usize) -> IndexMap<String, Value> {
    if step_index == 0 {
        resolve_first_step(step)
    } else {
        resolve_from_previous_output(step, context)
    }
}

fn resolve_first_step(step: &WorkflowStep) -> IndexMap<String, Value> {
    for (name, parameter) in &step.parameters {
        if parameter.required && is_empty_value(&parameter.value) {
            tracing::debug!(
                step = %step.step_id,
                parameter = %name,
                "required first-step parameter has no literal value"
            );
            return IndexMap::new();
        }
    }

    step.parameters
        .iter()
        .map(|(name, parameter)| (name.clone(), parameter.value.clone()))
        .collect()
}

fn resolve_from_previous_output(step: &WorkflowStep, context: &ExecutionContext) -> IndexMap<String, Value> {
    let Some(previous_output) = &context.previous_output else {
        return IndexMap::new();
    };

    let mut arguments = IndexMap::new();
    let mut bound = 0usize;
    for (name, parameter) in &step.parameters {
        if binding_matches(&parameter.r#type, &context.previous_output_type, previous_output) {
            arguments.insert(name.clone(), previous_output.clone());
            bound += 1;
        } else {
            arguments.insert(name.clone(), parameter.value.clone());
        }
    }

    if bound == 0 {
        tracing::debug!(
            step = %step.step_id,
            previous_type = %context.previous_output_type,
            "no declared parameter accepts the previous step's output"
        );
        return IndexMap::new();
    }
    arguments
}

/// A declared tag accepts the previous output when it equals the recorded
/// return tag exactly, or when it structurally describes the output's runtime
/// shape (any sequence tag accepts an array, any mapping tag an object, and
/// scalar tags their corresponding scalars).
fn binding_matches(declared: &TypeTag, recorded: &TypeTag, output: &Value) -> bool {
    if !declared.is_null() && declared == recorded {
        return true;
    }
    declared.matches_value(output)
}
