//! Arcanea Workflows - Multi-Phase Orchestration
//!
//! A workflow is an ordered list of phases. Phases run strictly in order;
//! each one may read earlier outputs through dotted input references such as
//! `foundation.cosmology`, and a phase with an output key publishes its
//! result under that key for the phases after it.
//!
//! - Critical phase failures stop the run; non-critical ones are recorded
//! - Per-phase timeouts are enforced when `enforce_phase_timeouts` is set
//! - `workflow` phases run another registered workflow as a sub-run

mod defaults;
mod definition;
mod input;
mod instance;
mod metrics;
mod orchestrator;

pub use defaults::default_workflows;
pub use definition::{CompletionHandler, PhaseAction, PhaseSpec, WorkflowDefinition};
pub use input::resolve_inputs;
pub use instance::{
    PhaseResult, WorkflowInstance, WorkflowRunResult, WorkflowStatus, WorkflowStatusReport,
    WorkflowSummary,
};
pub use metrics::WorkflowMetrics;
pub use orchestrator::{WorkflowOrchestrator, MAX_NESTING_DEPTH};
