//! Catalog document schema.
//!
//! A catalog describes the capabilities available to the engine: which
//! operations each capability exposes, what parameters those operations
//! declare, and the type tag of their return value. Catalogs are authored
//! out-of-band (one document per deployment) and loaded at startup; the
//! engine treats them as read-only metadata.

use serde::{Deserialize, Serialize};
use socialflow_types::TypeTag;

/// Declared parameter of a capability operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name as accepted by the operation.
    pub name: String,
    /// Declared type tag.
    #[serde(default, rename = "type")]
    pub r#type: TypeTag,
    /// Whether the operation requires the parameter.
    #[serde(default)]
    pub required: bool,
    /// Human-readable explanation for planner prompts and docs.
    #[serde(default)]
    pub description: Option<String>,
}

/// Optional HTTP binding for operations served by a REST capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpBinding {
    /// HTTP method (GET, POST, ...).
    pub method: String,
    /// Request path relative to the capability's base URL.
    pub path: String,
    /// Whether the endpoint pages results with a cursor.
    #[serde(default)]
    pub paginated: bool,
}

/// One operation exposed by a capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Operation name, unique within its capability.
    pub operation_id: String,
    /// Short description of what the operation does.
    #[serde(default)]
    pub description: String,
    /// Declared parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Declared type tag of the operation's return value.
    #[serde(default)]
    pub return_type: TypeTag,
    /// HTTP binding, present only for REST-served operations.
    #[serde(default)]
    pub http: Option<HttpBinding>,
}

/// A named capability and the operations it exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Capability identifier, conventionally `<platform>_<category>`.
    pub capability_id: String,
    /// Short description of the capability.
    #[serde(default)]
    pub description: String,
    /// Operations exposed by the capability.
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,
}

impl CapabilityDescriptor {
    /// Look up an operation by name.
    pub fn operation(&self, operation_id: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.operation_id == operation_id)
    }
}

/// Top-level catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapabilityCatalog {
    /// All capability descriptors in the deployment.
    #[serde(default)]
    pub capabilities: Vec<CapabilityDescriptor>,
}

impl CapabilityCatalog {
    /// Look up a capability descriptor by identifier.
    pub fn capability(&self, capability_id: &str) -> Option<&CapabilityDescriptor> {
        self.capabilities.iter().find(|cap| cap.capability_id == capability_id)
    }

    /// Reject catalogs with duplicate capability or operation identifiers.
    pub fn ensure_unique_identifiers(&self) -> Result<(), String> {
        let mut seen_capabilities = std::collections::HashSet::new();
        for capability in &self.capabilities {
            if !seen_capabilities.insert(capability.capability_id.as_str()) {
                return Err(format!("duplicate capability identifier '{}'", capability.capability_id));
            }
            let mut seen_operations = std::collections::HashSet::new();
            for operation in &capability.operations {
                if !seen_operations.insert(operation.operation_id.as_str()) {
                    return Err(format!(
                        "capability '{}' declares duplicate operation '{}'",
                        capability.capability_id, operation.operation_id
                    ));
                }
            }
        }
        Ok(())
    }
}
