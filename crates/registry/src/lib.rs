//! Capability catalog and registry.
//!
//! This crate provides the lookup boundary between the workflow engine and
//! the platform capabilities it invokes:
//!
//! - `models` defines the catalog document: per-capability operation
//!   descriptors with declared parameter and return type tags
//! - `catalog` loads catalog documents from JSON or YAML files
//! - `capability` defines the [`Capability`] trait and the
//!   [`CapabilityRegistry`] that maps string identifiers to instances
//!
//! The registry is populated at startup and read-only for the lifetime of a
//! run; the engine only ever calls [`CapabilityRegistry::find`].

pub mod capability;
pub mod catalog;
pub mod models;

pub use capability::{Capability, CapabilityRegistry, RegistryError, ResolvedOperation};
pub use catalog::load_catalog_file;
pub use models::{CapabilityCatalog, CapabilityDescriptor, HttpBinding, OperationDescriptor, ParameterDescriptor};
