//! Workflow plan schema shared between the planner boundary and the engine.
//!
//! A [`WorkflowDefinition`] is the declarative, ordered plan the planner
//! emits: an array of [`WorkflowStep`]s whose index is the execution order.
//! The engine treats the plan as data; the only semantic annotations are the
//! per-parameter [`TypeTag`]s that drive step-to-step binding. Parameter maps
//! preserve authoring order (via `IndexMap`) so argument maps and reports
//! render in a predictable sequence.

pub mod validation;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::TypeTag;

/// Declared metadata and literal value for a single step parameter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParameterSpec {
    /// Declared type tag, used for binding compatibility checks.
    #[serde(default, rename = "type")]
    pub r#type: TypeTag,
    /// Literal value authored by the planner. JSON null or an empty string
    /// means "bind from the previous step's output".
    #[serde(default)]
    pub value: Value,
    /// Whether the operation requires this parameter.
    #[serde(default)]
    pub required: bool,
    /// Optional human-readable explanation carried through for reporting.
    #[serde(default)]
    pub description: Option<String>,
}

impl ParameterSpec {
    /// Convenience constructor for a literal-valued parameter.
    pub fn literal(r#type: TypeTag, value: Value) -> Self {
        Self {
            r#type,
            value,
            required: false,
            description: None,
        }
    }

    /// Convenience constructor for a required parameter with no literal value.
    pub fn required(r#type: TypeTag) -> Self {
        Self {
            r#type,
            value: Value::Null,
            required: true,
            description: None,
        }
    }
}

/// One planned unit of work inside a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Unique identifier within the workflow; generated when the planner
    /// leaves it out.
    #[serde(default = "generate_id")]
    pub step_id: String,
    /// Capability the step targets, conventionally `<platform>_<category>`
    /// (for example `tiktok_crawler`).
    pub capability_id: String,
    /// Operation to invoke within the capability.
    pub operation_id: String,
    /// Human-readable intent, carried through for reporting only.
    #[serde(default)]
    pub description: String,
    /// Declared parameters keyed by name, in authoring order.
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterSpec>,
    /// Declared type tag of this step's output, consumed by the next step's
    /// bindings.
    #[serde(default)]
    pub return_type: TypeTag,
}

/// Ordered sequence of steps plus workflow identity and metadata.
///
/// The array index of a step is its execution order; there is no dependency
/// graph and no reordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique workflow identifier; generated when absent.
    #[serde(default = "generate_id")]
    pub workflow_id: String,
    /// Short workflow name for display.
    #[serde(default)]
    pub name: String,
    /// Descriptive copy for display.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp assigned by the planner.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Steps in authoritative execution order.
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    /// Structural well-formedness check applied at load boundaries: a plan
    /// must contain at least one step and step identifiers must be unique.
    pub fn ensure_well_formed(&self) -> Result<(), String> {
        if self.steps.is_empty() {
            return Err(format!("workflow '{}' contains no steps", self.workflow_id));
        }
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.step_id.as_str()) {
                return Err(format!(
                    "workflow '{}' declares duplicate step identifier '{}'",
                    self.workflow_id, step.step_id
                ));
            }
        }
        Ok(())
    }
}

fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
