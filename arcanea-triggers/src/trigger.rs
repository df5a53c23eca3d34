//! Trigger definitions and registry entries

use crate::action::{ActionResult, TriggerAction};
use crate::strategy::{MatchStrategy, Matcher};
use arcanea_core::{DurationMs, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A rule: a match strategy plus the actions to run when it matches.
#[derive(Debug, Clone)]
pub struct Trigger {
    /// Generated at registration when empty
    pub id: String,
    pub name: String,
    pub strategy: MatchStrategy,
    /// Base confidence; the engine default when `None`
    pub confidence: Option<f64>,
    /// Guardian to route to instead of asking the router
    pub guardian: Option<String>,
    pub actions: Vec<TriggerAction>,
    pub enabled: bool,
}

impl Trigger {
    pub fn new(id: impl Into<String>, name: impl Into<String>, strategy: MatchStrategy) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            strategy,
            confidence: None,
            guardian: None,
            actions: Vec::new(),
            enabled: true,
        }
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn guardian(mut self, guardian: impl Into<String>) -> Self {
        self.guardian = Some(guardian.into());
        self
    }

    pub fn action(mut self, action: TriggerAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A trigger as held by the engine, with its compiled matcher and counters.
#[derive(Debug, Clone)]
pub(crate) struct RegisteredTrigger {
    pub trigger: Trigger,
    pub matcher: Matcher,
    pub created_at: Timestamp,
    pub fire_count: u64,
    pub last_fired: Option<Timestamp>,
}

impl RegisteredTrigger {
    pub fn summary(&self) -> TriggerSummary {
        TriggerSummary {
            id: self.trigger.id.clone(),
            name: self.trigger.name.clone(),
            enabled: self.trigger.enabled,
            strategy: self.trigger.strategy.kind().to_string(),
            fire_count: self.fire_count,
            last_fired: self.last_fired,
            created_at: self.created_at,
        }
    }
}

/// Entry of `list_triggers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSummary {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub strategy: String,
    pub fire_count: u64,
    pub last_fired: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// One fired trigger in a `process` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub trigger_id: String,
    pub trigger_name: String,
    /// False when a critical action failed
    pub success: bool,
    pub confidence: f64,
    pub guardian: String,
    pub actions: Vec<ActionResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: DurationMs,
}

/// A processed context, stamped on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub context: Value,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerStats {
    pub triggers_fired: u64,
    pub registered_triggers: usize,
    pub enabled_triggers: usize,
    pub history_size: usize,
}
