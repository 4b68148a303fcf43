//! Loading planner-emitted workflow documents from disk.
//!
//! The planner hands the engine two things: a workflow definition and a
//! parameter validation report. On disk they travel together as one JSON or
//! YAML document; a bare workflow definition (no wrapper, no report) is also
//! accepted for hand-authored plans.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use socialflow_types::{ParameterValidationResult, WorkflowDefinition};

/// A workflow definition plus the planner's validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// The declarative plan.
    pub workflow: WorkflowDefinition,
    /// The planner's pre-flight verdict; absent for hand-authored plans.
    #[serde(default)]
    pub validation: Option<ParameterValidationResult>,
}

/// Load a workflow document from a JSON or YAML file.
///
/// Format detection follows the file extension (`.json` parses as JSON,
/// anything else as YAML). A document that is a bare workflow definition is
/// wrapped with no validation report. The workflow must be structurally
/// well-formed: non-empty steps with unique identifiers.
pub fn parse_workflow_document(path: impl AsRef<Path>) -> Result<WorkflowDocument> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("failed to read workflow file: {}", path.display()))?;

    let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
    let document = parse_document_str(&content, is_json).with_context(|| format!("invalid workflow document: {}", path.display()))?;

    document
        .workflow
        .ensure_well_formed()
        .map_err(|reason| anyhow::anyhow!("invalid workflow document {}: {}", path.display(), reason))?;
    Ok(document)
}

fn parse_document_str(content: &str, is_json: bool) -> Result<WorkflowDocument> {
    // Try the wrapped form first so a document with an embedded validation
    // report is never misread as a bare definition with unknown fields.
    if is_json {
        if let Ok(document) = serde_json::from_str::<WorkflowDocument>(content) {
            return Ok(document);
        }
        let workflow: WorkflowDefinition = serde_json::from_str(content)?;
        return Ok(WorkflowDocument { workflow, validation: None });
    }

    if let Ok(document) = serde_yaml::from_str::<WorkflowDocument>(content) {
        return Ok(document);
    }
    let workflow: WorkflowDefinition = serde_yaml::from_str(content)?;
    Ok(WorkflowDocument { workflow, validation: None })
}
