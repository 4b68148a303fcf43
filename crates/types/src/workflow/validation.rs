//! Parameter validation report produced by the planner.
//!
//! The planner inspects the first step of a freshly built workflow and
//! reports whether its required parameters are fully resolved. Later steps
//! are expected to receive their inputs through step-to-step data flow, so
//! the missing-parameter list is restricted to the first step by design. The
//! engine consumes this report as a pre-flight gate and never recomputes it.

use serde::{Deserialize, Serialize};

use crate::value::TypeTag;

/// A required parameter the planner could not resolve for the first step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingParameter {
    /// Parameter name as declared by the operation.
    pub name: String,
    /// Declared type tag of the parameter.
    #[serde(default, rename = "type")]
    pub r#type: TypeTag,
    /// Whether the operation requires the parameter.
    #[serde(default)]
    pub required: bool,
    /// Operation the parameter belongs to.
    #[serde(default)]
    pub operation_id: String,
    /// Step the parameter belongs to.
    #[serde(default)]
    pub step_id: String,
    /// Optional guidance for the user supplied by the planner.
    #[serde(default)]
    pub description: Option<String>,
}

/// A contradiction between authored parameter values detected by the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterConflict {
    /// Conflicting parameter name.
    pub parameter: String,
    /// Operation the parameter belongs to.
    #[serde(default)]
    pub operation_id: String,
    /// Step the parameter belongs to.
    #[serde(default)]
    pub step_id: String,
    /// Why the values conflict.
    pub reason: String,
    /// Optional suggested resolution.
    #[serde(default)]
    pub resolution: Option<String>,
}

/// Pre-flight verdict on a workflow's first-step parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterValidationResult {
    /// True only when both lists below are empty.
    pub is_valid: bool,
    /// Required first-step parameters with no resolved value.
    #[serde(default)]
    pub missing_required_parameters: Vec<MissingParameter>,
    /// Contradictory first-step parameter values.
    #[serde(default)]
    pub parameter_conflicts: Vec<ParameterConflict>,
}

impl ParameterValidationResult {
    /// A report declaring the workflow ready to execute.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            missing_required_parameters: Vec::new(),
            parameter_conflicts: Vec::new(),
        }
    }

    /// Invariant check: a report with findings must not claim validity.
    pub fn is_consistent(&self) -> bool {
        if self.missing_required_parameters.is_empty() && self.parameter_conflicts.is_empty() {
            true
        } else {
            !self.is_valid
        }
    }
}

impl Default for ParameterValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}
