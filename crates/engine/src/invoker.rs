//! Capability invocation.
//!
//! The invoker is the only component that calls capability code. It resolves
//! the capability/operation pair through the registry, drops arguments whose
//! value is empty (unresolved optionals), and awaits the call uniformly
//! whether the underlying operation suspends or returns immediately. The
//! caller always gets back a resolved value or a [`StepError`], never a
//! pending computation.
//!
//! The invoker performs no retries and tracks no idempotency: a second
//! invocation after a reported failure may duplicate external side effects.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Value, json};
use socialflow_registry::{CapabilityRegistry, RegistryError};
use socialflow_types::{ExecutionError, error_code, is_empty_value};
use thiserror::Error;

/// Step-level failures recorded against a single step's result.
#[derive(Debug, Error)]
pub enum StepError {
    /// The named capability is not registered.
    #[error("capability '{0}' is not registered")]
    CapabilityNotFound(String),
    /// The capability exists but does not expose the operation.
    #[error("capability '{capability_id}' does not expose operation '{operation_id}'")]
    OperationNotFound {
        /// Capability that was found.
        capability_id: String,
        /// Operation that was not.
        operation_id: String,
    },
    /// The step's parameters could not be resolved from context.
    #[error("step '{step_id}' could not resolve its parameters: {reason}")]
    BindingResolution {
        /// Step whose resolution failed.
        step_id: String,
        /// Why resolution failed.
        reason: String,
    },
    /// The underlying capability call raised.
    #[error("invoking '{capability_id}.{operation_id}' failed: {source}")]
    Invocation {
        /// Capability that was invoked.
        capability_id: String,
        /// Operation that was invoked.
        operation_id: String,
        /// The wrapped failure.
        #[source]
        source: anyhow::Error,
    },
}

impl StepError {
    /// Stable wire-level code for this failure class.
    pub fn error_code(&self) -> &'static str {
        match self {
            StepError::CapabilityNotFound(_) => error_code::CAPABILITY_NOT_FOUND,
            StepError::OperationNotFound { .. } => error_code::OPERATION_NOT_FOUND,
            StepError::BindingResolution { .. } => error_code::BINDING_RESOLUTION_ERROR,
            StepError::Invocation { .. } => error_code::CAPABILITY_INVOCATION_ERROR,
        }
    }

    /// Convert into the wire-level error attached to a step result. The
    /// original failure chain is preserved under `details.cause` for
    /// invocation errors.
    pub fn into_execution_error(self, step_id: &str) -> ExecutionError {
        let details = match &self {
            StepError::Invocation { source, .. } => json!({ "cause": format!("{source:#}") }),
            _ => Value::Null,
        };
        ExecutionError::new(self.error_code(), self.to_string())
            .for_step(step_id)
            .with_details(details)
    }
}

/// Drop arguments whose value is empty (JSON null or an empty string) so
/// unresolved optional parameters never reach the capability.
pub fn filter_arguments(arguments: IndexMap<String, Value>) -> IndexMap<String, Value> {
    arguments.into_iter().filter(|(_, value)| !is_empty_value(value)).collect()
}

/// Resolves capability identifiers and performs the call.
pub struct CapabilityInvoker {
    registry: Arc<CapabilityRegistry>,
}

impl CapabilityInvoker {
    /// Build an invoker over a shared, read-only registry.
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this invoker resolves against.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Invoke `capability_id.operation_id` with the resolved arguments.
    pub async fn invoke(
        &self,
        capability_id: &str,
        operation_id: &str,
        arguments: IndexMap<String, Value>,
    ) -> Result<Value, StepError> {
        let resolved = self.registry.find(capability_id, operation_id).map_err(lookup_error)?;
        let arguments = filter_arguments(arguments);

        tracing::debug!(
            capability = %capability_id,
            operation = %operation_id,
            argument_count = arguments.len(),
            "invoking capability operation"
        );

        resolved
            .capability
            .invoke(operation_id, arguments)
            .await
            .map_err(|source| StepError::Invocation {
                capability_id: capability_id.to_string(),
                operation_id: operation_id.to_string(),
                source,
            })
    }
}

fn lookup_error(error: RegistryError) -> StepError {
    match error {
        RegistryError::CapabilityNotFound(capability_id) => StepError::CapabilityNotFound(capability_id),
        RegistryError::OperationNotFound {
            capability_id,
            operation_id,
        } => StepError::OperationNotFound {
            capability_id,
            operation_id,
        },
        // Registration-time variants cannot come out of `find`; treat them as
        // a missing capability if they ever do.
        RegistryError::DuplicateCapability(capability_id) | RegistryError::MissingDescriptor(capability_id) => {
            StepError::CapabilityNotFound(capability_id)
        }
    }
}
