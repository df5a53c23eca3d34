//! Runtime event types

use arcanea_core::{DurationMs, InstanceId};
use serde::{Deserialize, Serialize};

/// Progress notifications emitted by the interpreter, trigger engine, and
/// workflow orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuntimeEvent {
    // ========================================================================
    // INTERPRETER EVENTS
    // ========================================================================
    /// Source text was parsed and interpreted.
    SourceLoaded {
        /// File path, if loaded from disk
        path: Option<String>,
        declarations: usize,
        parse_errors: usize,
    },

    /// A spell declaration was registered (or replaced).
    SpellRegistered { name: String },

    /// A spell cast completed.
    SpellCast {
        name: String,
        provider_id: String,
        guardian_id: Option<String>,
        duration_ms: DurationMs,
    },

    /// A spell cast failed in dispatch.
    SpellFailed { name: String, error: String },

    /// A character was registered.
    CharacterCreated { name: String },

    /// A world was registered.
    WorldBuilt { name: String },

    /// An archetype was bound in the global scope.
    ArchetypeDefined { name: String },

    /// An enrichment slot was left empty after a capability failure.
    EnrichmentFailed {
        entity: String,
        slot: String,
        error: String,
    },

    // ========================================================================
    // TRIGGER EVENTS
    // ========================================================================
    TriggerRegistered { trigger_id: String, name: String },

    TriggerUnregistered { trigger_id: String },

    TriggerStateChanged { trigger_id: String, enabled: bool },

    /// A trigger matched and its actions ran.
    TriggerExecuted {
        trigger_id: String,
        guardian: String,
        confidence: f64,
        success: bool,
    },

    /// A critical action failed and the trigger's remaining actions were skipped.
    TriggerFailed { trigger_id: String, error: String },

    // ========================================================================
    // WORKFLOW EVENTS
    // ========================================================================
    WorkflowRegistered { workflow_id: String },

    WorkflowStarted {
        instance_id: InstanceId,
        workflow_id: String,
    },

    PhaseCompleted {
        instance_id: InstanceId,
        phase_id: String,
        success: bool,
    },

    WorkflowCompleted {
        instance_id: InstanceId,
        workflow_id: String,
        duration_ms: DurationMs,
    },

    WorkflowFailed {
        instance_id: InstanceId,
        workflow_id: String,
        error: String,
    },

    WorkflowCancelled { instance_id: InstanceId },
}

impl RuntimeEvent {
    /// Variant name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            RuntimeEvent::SourceLoaded { .. } => "SourceLoaded",
            RuntimeEvent::SpellRegistered { .. } => "SpellRegistered",
            RuntimeEvent::SpellCast { .. } => "SpellCast",
            RuntimeEvent::SpellFailed { .. } => "SpellFailed",
            RuntimeEvent::CharacterCreated { .. } => "CharacterCreated",
            RuntimeEvent::WorldBuilt { .. } => "WorldBuilt",
            RuntimeEvent::ArchetypeDefined { .. } => "ArchetypeDefined",
            RuntimeEvent::EnrichmentFailed { .. } => "EnrichmentFailed",
            RuntimeEvent::TriggerRegistered { .. } => "TriggerRegistered",
            RuntimeEvent::TriggerUnregistered { .. } => "TriggerUnregistered",
            RuntimeEvent::TriggerStateChanged { .. } => "TriggerStateChanged",
            RuntimeEvent::TriggerExecuted { .. } => "TriggerExecuted",
            RuntimeEvent::TriggerFailed { .. } => "TriggerFailed",
            RuntimeEvent::WorkflowRegistered { .. } => "WorkflowRegistered",
            RuntimeEvent::WorkflowStarted { .. } => "WorkflowStarted",
            RuntimeEvent::PhaseCompleted { .. } => "PhaseCompleted",
            RuntimeEvent::WorkflowCompleted { .. } => "WorkflowCompleted",
            RuntimeEvent::WorkflowFailed { .. } => "WorkflowFailed",
            RuntimeEvent::WorkflowCancelled { .. } => "WorkflowCancelled",
        }
    }
}
