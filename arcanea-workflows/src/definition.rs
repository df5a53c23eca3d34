//! Workflow and phase definitions

use arcanea_core::ValueMap;
use serde::{Deserialize, Serialize};

/// What a phase does. Each variant carries only the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PhaseAction {
    /// Text generation from the phase prompt and resolved input.
    Generate,
    /// Improve the resolved input.
    Enhance,
    /// Check the resolved input.
    Validate,
    /// Generate once per guardian concurrently and await all.
    Parallel { guardians: Vec<String> },
    /// Run another registered workflow; its result map is this phase's output.
    Workflow { workflow_id: String },
}

impl PhaseAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PhaseAction::Generate => "generate",
            PhaseAction::Enhance => "enhance",
            PhaseAction::Validate => "validate",
            PhaseAction::Parallel { .. } => "parallel",
            PhaseAction::Workflow { .. } => "workflow",
        }
    }
}

/// Checks run after a workflow completes. They log and never change the
/// run's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionHandler {
    ValidateWorld,
    ValidateCharacter,
    ValidateStory,
    ValidateSpell,
}

impl CompletionHandler {
    /// Result key whose presence the handler checks.
    pub fn required_key(&self) -> &'static str {
        match self {
            CompletionHandler::ValidateWorld => "cosmology",
            CompletionHandler::ValidateCharacter => "archetype",
            CompletionHandler::ValidateStory | CompletionHandler::ValidateSpell => "concept",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            CompletionHandler::ValidateWorld => "world",
            CompletionHandler::ValidateCharacter => "character",
            CompletionHandler::ValidateStory => "story",
            CompletionHandler::ValidateSpell => "spell",
        }
    }
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub id: String,
    pub name: String,
    /// Guardian running the phase; the workflow's orchestrator when absent
    #[serde(default)]
    pub guardian: Option<String>,
    /// Skill the phase exercises, informational
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(flatten)]
    pub action: PhaseAction,
    #[serde(default)]
    pub prompt: String,
    /// Dotted references into earlier phases' outputs, e.g. `foundation.cosmology`
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Static input merged before references are resolved
    #[serde(default)]
    pub parameters: ValueMap,
    #[serde(default)]
    pub output_key: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_critical")]
    pub critical: bool,
}

fn default_critical() -> bool {
    true
}

impl PhaseSpec {
    /// A critical phase with no inputs, output key, or timeout.
    pub fn new(id: impl Into<String>, name: impl Into<String>, action: PhaseAction) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guardian: None,
            skill: None,
            action,
            prompt: String::new(),
            inputs: Vec::new(),
            parameters: ValueMap::new(),
            output_key: None,
            timeout_ms: None,
            critical: true,
        }
    }

    pub fn generate(id: impl Into<String>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        let mut phase = Self::new(id, name, PhaseAction::Generate);
        phase.prompt = prompt.into();
        phase
    }

    pub fn guardian(mut self, guardian: impl Into<String>) -> Self {
        self.guardian = Some(guardian.into());
        self
    }

    pub fn skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn inputs(mut self, refs: &[&str]) -> Self {
        self.inputs = refs.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn output(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// A named, ordered pipeline of phases. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Guardian that runs phases which name none
    pub orchestrator: String,
    pub phases: Vec<PhaseSpec>,
    #[serde(default)]
    pub on_complete: Option<CompletionHandler>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_action_serializes_flat() {
        let phase = PhaseSpec::new(
            "characters",
            "Character Ensemble",
            PhaseAction::Workflow {
                workflow_id: "character-creation".to_string(),
            },
        )
        .output("characters");
        let value = serde_json::to_value(&phase).unwrap();
        assert_eq!(value["action"], json!("workflow"));
        assert_eq!(value["workflow_id"], json!("character-creation"));
        assert_eq!(value["critical"], json!(true));
    }

    #[test]
    fn test_phase_deserializes_with_defaults() {
        let phase: PhaseSpec = serde_json::from_value(json!({
            "id": "check",
            "name": "Check",
            "action": "validate"
        }))
        .unwrap();
        assert_eq!(phase.action, PhaseAction::Validate);
        assert!(phase.critical);
        assert!(phase.inputs.is_empty());
        assert_eq!(phase.timeout_ms, None);
    }

    #[test]
    fn test_completion_handler_keys() {
        assert_eq!(CompletionHandler::ValidateWorld.required_key(), "cosmology");
        assert_eq!(CompletionHandler::ValidateCharacter.subject(), "character");
        assert_eq!(PhaseAction::Parallel { guardians: vec![] }.kind(), "parallel");
    }
}
