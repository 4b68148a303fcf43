//! The [`Capability`] trait and the registry that resolves identifiers to
//! capability instances.
//!
//! Capabilities are late-bound: workflow plans reference them by string
//! identifier, and the registry maps those identifiers to trait objects at
//! lookup time. Operation existence is checked against the catalog descriptor
//! so a plan can be rejected without invoking anything.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::models::{CapabilityCatalog, OperationDescriptor};

/// A named external unit of functionality (platform crawler, analysis
/// routine, posting action) exposing one or more operations.
///
/// Implementations may perform network I/O and suspend; purely synchronous
/// capabilities simply return without awaiting. Errors are reported as
/// `anyhow::Error` and wrapped by the engine's invoker.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Identifier the registry and workflow plans use for this capability.
    fn capability_id(&self) -> &str;

    /// Invoke the named operation with keyword arguments.
    async fn invoke(&self, operation_id: &str, arguments: IndexMap<String, Value>) -> anyhow::Result<Value>;
}

/// Lookup failures surfaced by [`CapabilityRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No capability instance is registered under the identifier.
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
    /// An instance is already registered under the identifier.
    #[error("capability '{0}' is already registered")]
    DuplicateCapability(String),
    /// The catalog has no descriptor for the instance being registered.
    #[error("capability '{0}' has no catalog descriptor")]
    MissingDescriptor(String),
}

/// A successful registry lookup: the capability instance plus the catalog
/// descriptor of the requested operation.
pub struct ResolvedOperation<'registry> {
    /// The capability to invoke.
    pub capability: Arc<dyn Capability>,
    /// Catalog metadata for the operation.
    pub descriptor: &'registry OperationDescriptor,
}

impl std::fmt::Debug for ResolvedOperation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedOperation")
            .field("capability", &self.capability.capability_id())
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// Read-mostly mapping from capability identifiers to instances.
///
/// Populated once at startup and shared across concurrent runs behind an
/// `Arc`; nothing mutates it after registration finishes.
pub struct CapabilityRegistry {
    catalog: CapabilityCatalog,
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry over a catalog.
    pub fn new(catalog: CapabilityCatalog) -> Self {
        Self {
            catalog,
            capabilities: HashMap::new(),
        }
    }

    /// The catalog this registry was built from.
    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    /// Register a capability instance.
    ///
    /// The instance must have a descriptor in the catalog, and each
    /// identifier may be registered only once.
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Result<(), RegistryError> {
        let capability_id = capability.capability_id().to_string();
        if self.catalog.capability(&capability_id).is_none() {
            return Err(RegistryError::MissingDescriptor(capability_id));
        }
        if self.capabilities.contains_key(&capability_id) {
            return Err(RegistryError::DuplicateCapability(capability_id));
        }
        tracing::debug!(capability = %capability_id, "registered capability");
        self.capabilities.insert(capability_id, capability);
        Ok(())
    }

    /// Resolve a capability/operation pair to an invocable instance.
    pub fn find(&self, capability_id: &str, operation_id: &str) -> Result<ResolvedOperation<'_>, RegistryError> {
        let capability = self
            .capabilities
            .get(capability_id)
            .cloned()
            .ok_or_else(|| RegistryError::CapabilityNotFound(capability_id.to_string()))?;

        let descriptor = self
            .catalog
            .capability(capability_id)
            .and_then(|descriptor| descriptor.operation(operation_id))
            .ok_or_else(|| RegistryError::OperationNotFound {
                capability_id: capability_id.to_string(),
                operation_id: operation_id.to_string(),
            })?;

        Ok(ResolvedOperation { capability, descriptor })
    }
}
