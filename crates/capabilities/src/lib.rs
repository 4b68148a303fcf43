//! Built-in capabilities: thin wrappers the engine invokes through the
//! registry.
//!
//! - `rest` serves catalog operations backed by HTTP endpoints, including
//!   cursor-based pagination for crawler-style listing endpoints
//! - `transform` serves pure in-process record cleaning and summarising
//!
//! Both implement the [`Capability`](socialflow_registry::Capability) trait;
//! nothing here knows about workflows or steps.

pub mod rest;
pub mod transform;

pub use rest::{RestCapability, RestConfig};
pub use transform::TransformCapability;
