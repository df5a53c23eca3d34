//! Trigger actions

use crate::strategy::MatchOutcome;
use arcanea_core::{CapabilityError, DurationMs, ValueMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// What a matched trigger hands to a custom action.
#[derive(Debug, Clone, Copy)]
pub struct ActionInvocation<'a> {
    pub context: &'a Value,
    pub guardian: &'a str,
    pub outcome: &'a MatchOutcome,
    pub parameters: &'a ValueMap,
}

/// Host-supplied behaviour for `custom` actions.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, invocation: ActionInvocation<'_>) -> Result<Value, CapabilityError>;
}

/// The closed set of things a trigger can do once matched.
#[derive(Clone)]
pub enum ActionKind {
    Generate,
    Analyze,
    Enhance,
    Transform,
    Validate,
    /// Guardian suggestions plus templates for each skill
    Suggest { skills: Vec<String> },
    /// Start a registered workflow with the trigger context
    Workflow { workflow_id: String },
    Custom(Arc<dyn ActionHandler>),
}

impl ActionKind {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionKind::Generate => "generate",
            ActionKind::Analyze => "analyze",
            ActionKind::Enhance => "enhance",
            ActionKind::Transform => "transform",
            ActionKind::Validate => "validate",
            ActionKind::Suggest { .. } => "suggest",
            ActionKind::Workflow { .. } => "workflow",
            ActionKind::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Suggest { skills } => f.debug_struct("Suggest").field("skills", skills).finish(),
            ActionKind::Workflow { workflow_id } => f
                .debug_struct("Workflow")
                .field("workflow_id", workflow_id)
                .finish(),
            ActionKind::Custom(handler) => f.debug_tuple("Custom").field(&handler.name()).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// One step of a trigger's action list.
#[derive(Debug, Clone)]
pub struct TriggerAction {
    pub name: Option<String>,
    pub kind: ActionKind,
    /// Action-specific settings, e.g. `prompt` for `generate`
    pub parameters: ValueMap,
    /// A failure skips the remaining actions and fails the trigger
    pub critical: bool,
}

impl TriggerAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            name: None,
            kind,
            parameters: ValueMap::new(),
            critical: false,
        }
    }

    pub fn suggest(skills: &[&str]) -> Self {
        Self::new(ActionKind::Suggest {
            skills: skills.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn workflow(workflow_id: impl Into<String>) -> Self {
        Self::new(ActionKind::Workflow {
            workflow_id: workflow_id.into(),
        })
    }

    pub fn custom(handler: Arc<dyn ActionHandler>) -> Self {
        Self::new(ActionKind::Custom(handler))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    /// Explicit name, else the action kind.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.kind.kind().to_string())
    }

    /// Instruction for content actions, read from the kind's parameter.
    pub(crate) fn instruction(&self) -> String {
        let key = match self.kind {
            ActionKind::Analyze => "analysis_type",
            ActionKind::Enhance => "enhancement_type",
            ActionKind::Transform => "target_format",
            ActionKind::Validate => "rules",
            _ => "instruction",
        };
        self.parameters
            .get(key)
            .or_else(|| self.parameters.get("instruction"))
            .map(arcanea_core::coerce_to_string)
            .unwrap_or_default()
    }
}

/// Outcome of one executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: DurationMs,
}
