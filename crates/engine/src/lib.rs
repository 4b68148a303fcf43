//! Workflow execution engine: turns a declarative plan into a sequence of
//! capability invocations with step-to-step data flow.
//!
//! - `resolve` decides, per parameter, between an authored literal and the
//!   previous step's output (type-tag based single-slot binding)
//! - `invoker` resolves capability identifiers via the registry and performs
//!   the call, filtering out empty arguments first
//! - `runner` drives the sequential loop, accumulates per-step results and
//!   metrics, and emits progress events over a Tokio channel
//! - `document` loads planner-emitted workflow documents from JSON or YAML
//!
//! Steps execute strictly in declared order and the run fails fast: the first
//! step failure terminates the loop, and the completed steps' results remain
//! available for diagnostics.

pub mod context;
pub mod document;
pub mod invoker;
pub mod resolve;
pub mod runner;

pub use context::ExecutionContext;
pub use document::{WorkflowDocument, parse_workflow_document};
pub use invoker::{CapabilityInvoker, StepError, filter_arguments};
pub use resolve::resolve_step_arguments;
pub use runner::WorkflowRunner;
