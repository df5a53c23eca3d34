//! Trigger Engine
//!
//! Holds registered triggers in registration order and evaluates each
//! processed context against them. A matching trigger resolves a guardian,
//! runs its actions in order, and reports a [`MatchResult`].

use crate::action::{ActionInvocation, ActionKind, ActionResult, TriggerAction};
use crate::builtin::builtin_triggers;
use crate::router::{skill_suggestions, GuardianRouter, Suggestion};
use crate::strategy::{context_text, MatchOutcome, Matcher};
use crate::trigger::{
    HistoryEntry, MatchResult, RegisteredTrigger, Trigger, TriggerStats, TriggerSummary,
};
use arcanea_core::{
    coerce_to_string, elapsed_ms, new_instance_id, now, ArcaneaConfig, CapabilityError,
    Timestamp, TriggerError,
};
use arcanea_events::{EventBus, RuntimeEvent};
use arcanea_llm::{
    CapabilityResponse, ContentRequest, GenerationOptions, GenerationProvider, GenerationRequest,
};
use arcanea_workflows::WorkflowOrchestrator;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Evaluates contexts against registered triggers. Engines share nothing
/// unless handed the same provider, bus, or orchestrator.
pub struct TriggerEngine {
    config: ArcaneaConfig,
    provider: Arc<dyn GenerationProvider>,
    events: EventBus,
    router: GuardianRouter,
    triggers: Vec<RegisteredTrigger>,
    history: VecDeque<HistoryEntry>,
    triggers_fired: u64,
    orchestrator: Option<Arc<WorkflowOrchestrator>>,
}

impl TriggerEngine {
    /// Engine with no triggers registered.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            config: ArcaneaConfig::default(),
            provider,
            events: EventBus::default(),
            router: GuardianRouter::new(),
            triggers: Vec::new(),
            history: VecDeque::new(),
            triggers_fired: 0,
            orchestrator: None,
        }
    }

    pub fn with_config(mut self, config: ArcaneaConfig) -> Self {
        self.config = config;
        self.trim_history();
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Orchestrator used by `workflow` actions.
    pub fn with_orchestrator(mut self, orchestrator: Arc<WorkflowOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Register the built-in example triggers.
    pub fn with_builtin_triggers(mut self) -> Result<Self, TriggerError> {
        for trigger in builtin_triggers() {
            self.register(trigger)?;
        }
        Ok(self)
    }

    pub fn config(&self) -> &ArcaneaConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn router(&self) -> &GuardianRouter {
        &self.router
    }

    // ========================================================================
    // REGISTRY
    // ========================================================================

    /// Compile and register a trigger, replacing one with the same id in
    /// place. An empty id is replaced with a generated one. Returns the id.
    pub fn register(&mut self, mut trigger: Trigger) -> Result<String, TriggerError> {
        if trigger.id.is_empty() {
            trigger.id = format!("trigger_{}", new_instance_id());
        }
        let matcher = Matcher::compile(&trigger.strategy)?;
        let id = trigger.id.clone();
        let name = trigger.name.clone();
        let entry = RegisteredTrigger {
            trigger,
            matcher,
            created_at: now(),
            fire_count: 0,
            last_fired: None,
        };

        match self.triggers.iter_mut().find(|t| t.trigger.id == id) {
            Some(existing) => {
                debug!(trigger_id = %id, "Replaced trigger");
                *existing = entry;
            }
            None => self.triggers.push(entry),
        }
        info!(trigger_id = %id, name = %name, "Registered trigger");
        self.events.emit(RuntimeEvent::TriggerRegistered {
            trigger_id: id.clone(),
            name,
        });
        Ok(id)
    }

    /// Remove a trigger. Returns whether it existed.
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.triggers.len();
        self.triggers.retain(|t| t.trigger.id != id);
        let removed = self.triggers.len() != before;
        if removed {
            info!(trigger_id = %id, "Unregistered trigger");
            self.events.emit(RuntimeEvent::TriggerUnregistered {
                trigger_id: id.to_string(),
            });
        }
        removed
    }

    /// Enable or disable a trigger. Returns whether it exists.
    pub fn set_trigger_state(&mut self, id: &str, enabled: bool) -> bool {
        let Some(entry) = self.triggers.iter_mut().find(|t| t.trigger.id == id) else {
            return false;
        };
        entry.trigger.enabled = enabled;
        debug!(trigger_id = %id, enabled, "Trigger state changed");
        self.events.emit(RuntimeEvent::TriggerStateChanged {
            trigger_id: id.to_string(),
            enabled,
        });
        true
    }

    pub fn get_trigger(&self, id: &str) -> Option<&Trigger> {
        self.triggers
            .iter()
            .find(|t| t.trigger.id == id)
            .map(|t| &t.trigger)
    }

    /// Registered triggers in registration order.
    pub fn list_triggers(&self) -> Vec<TriggerSummary> {
        self.triggers.iter().map(RegisteredTrigger::summary).collect()
    }

    /// The most recent `limit` processed contexts, oldest first.
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    pub fn stats(&self) -> TriggerStats {
        TriggerStats {
            triggers_fired: self.triggers_fired,
            registered_triggers: self.triggers.len(),
            enabled_triggers: self.triggers.iter().filter(|t| t.trigger.enabled).count(),
            history_size: self.history.len(),
        }
    }

    // ========================================================================
    // PROCESSING
    // ========================================================================

    /// Evaluate `context` against every enabled trigger at the current instant.
    pub async fn process(&mut self, context: Value) -> Vec<MatchResult> {
        self.process_at(context, now()).await
    }

    /// Evaluate `context` with `at` as the instant seen by scheduled triggers.
    pub async fn process_at(&mut self, context: Value, at: Timestamp) -> Vec<MatchResult> {
        self.history.push_back(HistoryEntry {
            context: context.clone(),
            timestamp: at,
        });
        self.trim_history();

        let mut results = Vec::new();
        for index in 0..self.triggers.len() {
            let entry = &self.triggers[index];
            if !entry.trigger.enabled {
                continue;
            }
            let base = entry
                .trigger
                .confidence
                .unwrap_or(self.config.default_confidence);
            let Some(outcome) = entry.matcher.evaluate(&context, base, at) else {
                continue;
            };
            let trigger = entry.trigger.clone();
            debug!(
                trigger_id = %trigger.id,
                confidence = outcome.confidence,
                "Trigger matched"
            );

            let result = self.execute_trigger(&trigger, &context, outcome).await;

            let entry = &mut self.triggers[index];
            entry.fire_count += 1;
            entry.last_fired = Some(at);
            self.triggers_fired += 1;
            results.push(result);
        }
        results
    }

    async fn execute_trigger(
        &self,
        trigger: &Trigger,
        context: &Value,
        outcome: MatchOutcome,
    ) -> MatchResult {
        let start = now();
        let guardian = trigger
            .guardian
            .clone()
            .unwrap_or_else(|| self.router.select(context_text(context)).to_string());

        let mut actions = Vec::with_capacity(trigger.actions.len());
        let mut error = None;
        for action in &trigger.actions {
            let action_start = now();
            let name = action.display_name();
            let result = self
                .execute_action(action, context, &guardian, &outcome)
                .await;
            let duration_ms = elapsed_ms(action_start);
            match result {
                Ok(output) => actions.push(ActionResult {
                    name,
                    success: true,
                    output: Some(output),
                    error: None,
                    duration_ms,
                }),
                Err(e) => {
                    warn!(
                        trigger_id = %trigger.id,
                        action = %name,
                        critical = action.critical,
                        error = %e,
                        "Trigger action failed"
                    );
                    actions.push(ActionResult {
                        name,
                        success: false,
                        output: None,
                        error: Some(e.to_string()),
                        duration_ms,
                    });
                    if action.critical {
                        error = Some(e.to_string());
                        break;
                    }
                }
            }
        }

        let success = error.is_none();
        if let Some(error) = &error {
            self.events.emit(RuntimeEvent::TriggerFailed {
                trigger_id: trigger.id.clone(),
                error: error.clone(),
            });
        }
        info!(
            trigger_id = %trigger.id,
            guardian = %guardian,
            success,
            actions = actions.len(),
            "Trigger executed"
        );
        self.events.emit(RuntimeEvent::TriggerExecuted {
            trigger_id: trigger.id.clone(),
            guardian: guardian.clone(),
            confidence: outcome.confidence,
            success,
        });

        MatchResult {
            trigger_id: trigger.id.clone(),
            trigger_name: trigger.name.clone(),
            success,
            confidence: outcome.confidence,
            guardian,
            actions,
            matches: outcome.matches,
            groups: outcome.groups,
            error,
            duration_ms: elapsed_ms(start),
        }
    }

    async fn execute_action(
        &self,
        action: &TriggerAction,
        context: &Value,
        guardian: &str,
        outcome: &MatchOutcome,
    ) -> Result<Value, TriggerError> {
        let failed = |reason: String| TriggerError::ActionFailed {
            action: action.display_name(),
            reason,
        };
        let provider = self.config.default_text_provider.as_str();

        match &action.kind {
            ActionKind::Generate => {
                let prompt = action
                    .parameters
                    .get("prompt")
                    .map(coerce_to_string)
                    .unwrap_or_else(|| context_text(context).to_string());
                let mut extra = action.parameters.clone();
                extra.remove("prompt");
                extra.insert("context".to_string(), context.clone());
                let request = GenerationRequest::new(provider, prompt).with_options(
                    GenerationOptions {
                        guardian: Some(guardian.to_string()),
                        extra,
                        ..Default::default()
                    },
                );
                let response = self.provider.generate_text(request).await;
                capability_output(response, provider).map_err(|e| failed(e.to_string()))
            }
            ActionKind::Analyze
            | ActionKind::Enhance
            | ActionKind::Transform
            | ActionKind::Validate => {
                let mut request = ContentRequest::new(
                    action.instruction(),
                    Value::String(context_text(context).to_string()),
                )
                .with_guardian(guardian)
                .with_context(context.clone());
                request.provider_id = Some(provider.to_string());

                let response = match action.kind {
                    ActionKind::Analyze => self.provider.analyze(request).await,
                    ActionKind::Enhance => self.provider.enhance(request).await,
                    ActionKind::Transform => self.provider.transform(request).await,
                    _ => self.provider.validate(request).await,
                };
                capability_output(response, provider).map_err(|e| failed(e.to_string()))
            }
            ActionKind::Suggest { skills } => {
                let suggestions: Vec<Suggestion> = self
                    .router
                    .suggestions(guardian)
                    .into_iter()
                    .chain(skills.iter().flat_map(|skill| skill_suggestions(skill)))
                    .collect();
                let count = suggestions.len();
                let entries: Vec<Value> = suggestions
                    .into_iter()
                    .map(|s| json!({ "type": s.kind, "text": s.text }))
                    .collect();
                Ok(json!({
                    "guardian": guardian,
                    "suggestions": entries,
                    "count": count,
                }))
            }
            ActionKind::Workflow { workflow_id } => {
                let orchestrator = self
                    .orchestrator
                    .as_ref()
                    .ok_or_else(|| failed("no workflow orchestrator attached".to_string()))?;
                let run = orchestrator
                    .start_workflow(workflow_id, context.clone())
                    .await
                    .map_err(|e| failed(e.to_string()))?;
                if !run.success {
                    return Err(failed(
                        run.error
                            .unwrap_or_else(|| format!("workflow {} failed", workflow_id)),
                    ));
                }
                serde_json::to_value(&run).map_err(|e| failed(e.to_string()))
            }
            ActionKind::Custom(handler) => handler
                .handle(ActionInvocation {
                    context,
                    guardian,
                    outcome,
                    parameters: &action.parameters,
                })
                .await
                .map_err(|e| failed(e.to_string())),
        }
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.config.max_history {
            self.history.pop_front();
        }
    }
}

fn capability_output(
    response: Result<CapabilityResponse, CapabilityError>,
    provider: &str,
) -> Result<Value, CapabilityError> {
    response?.into_result(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::MatchStrategy;
    use arcanea_llm::{Capability, MockGenerationProvider};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    fn engine(mock: MockGenerationProvider) -> (TriggerEngine, Arc<MockGenerationProvider>) {
        let mock = Arc::new(mock);
        (TriggerEngine::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_keyword_confidence_through_engine() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(
            Trigger::new("fire", "Fire", MatchStrategy::keywords(&["stuck", "blocked", "fire"]))
                .confidence(0.85),
        )?;

        let two = engine.process(json!({"text": "stuck and on fire"})).await;
        let one = engine.process(json!({"text": "just stuck"})).await;

        assert!((two[0].confidence - 0.85 * 2.0 / 3.0).abs() < 1e-9);
        assert!((one[0].confidence - 0.85 / 3.0).abs() < 1e-9);
        assert!(engine.process(json!({"text": "all good"})).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_router_picks_guardian_when_unbound() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(Trigger::new("any", "Any", MatchStrategy::pattern(".")))?;

        let results = engine.process(json!({"text": "ignite the scene"})).await;
        assert_eq!(results[0].guardian, "dragon-forge");

        let results = engine.process(json!({"text": "a quiet afternoon"})).await;
        assert_eq!(results[0].guardian, "elemental-fusion");
        Ok(())
    }

    #[tokio::test]
    async fn test_critical_failure_skips_remaining_actions() -> Result<(), TriggerError> {
        let (mut engine, mock) = engine(MockGenerationProvider::new().fail_when("Draft"));
        engine.register(
            Trigger::new("chain", "Chain", MatchStrategy::keywords(&["draft"]))
                .action(
                    TriggerAction::new(ActionKind::Generate)
                        .parameter("prompt", json!("Draft it"))
                        .critical(),
                )
                .action(TriggerAction::new(ActionKind::Analyze)),
        )?;

        let results = engine.process(json!({"text": "draft please"})).await;
        let result = &results[0];
        assert!(!result.success);
        assert_eq!(result.actions.len(), 1);
        assert!(result.error.is_some());
        assert!(mock.calls_for(Capability::Analyze).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_non_critical_failure_continues() -> Result<(), TriggerError> {
        let (mut engine, mock) = engine(MockGenerationProvider::new().error_when("Draft"));
        engine.register(
            Trigger::new("chain", "Chain", MatchStrategy::keywords(&["draft"]))
                .action(
                    TriggerAction::new(ActionKind::Generate).parameter("prompt", json!("Draft it")),
                )
                .action(
                    TriggerAction::new(ActionKind::Analyze)
                        .parameter("analysis_type", json!("tone")),
                ),
        )?;

        let results = engine.process(json!({"text": "draft please"})).await;
        let result = &results[0];
        assert!(result.success);
        assert_eq!(result.actions.len(), 2);
        assert!(!result.actions[0].success);
        assert!(result.actions[1].success);
        assert_eq!(mock.calls_for(Capability::Analyze).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let (engine, _) = engine(MockGenerationProvider::new());
        let mut engine = engine.with_config(ArcaneaConfig {
            max_history: 3,
            ..Default::default()
        });
        for i in 0..5 {
            engine.process(json!({"text": format!("entry {}", i)})).await;
        }

        let history = engine.history(10);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].context["text"], "entry 2");
        assert_eq!(engine.history(1)[0].context["text"], "entry 4");
        assert_eq!(engine.stats().history_size, 3);
    }

    #[tokio::test]
    async fn test_disabled_triggers_are_skipped() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(
            Trigger::new("off", "Off", MatchStrategy::keywords(&["plot"])).disabled(),
        )?;
        assert!(engine.process(json!({"text": "plot"})).await.is_empty());

        assert!(engine.set_trigger_state("off", true));
        assert_eq!(engine.process(json!({"text": "plot"})).await.len(), 1);
        assert!(!engine.set_trigger_state("missing", true));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_replaces_in_place_and_generates_ids() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(Trigger::new("a", "First", MatchStrategy::keywords(&["x"])))?;
        engine.register(Trigger::new("b", "Second", MatchStrategy::keywords(&["y"])))?;
        engine.register(Trigger::new("a", "First again", MatchStrategy::keywords(&["z"])))?;
        let generated =
            engine.register(Trigger::new("", "Anonymous", MatchStrategy::keywords(&["w"])))?;

        let names: Vec<String> = engine.list_triggers().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["First again", "Second", "Anonymous"]);
        assert!(generated.starts_with("trigger_"));
        assert!(engine.unregister("b"));
        assert!(!engine.unregister("b"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_trigger_is_rejected() {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        let cron = MatchStrategy::Scheduled {
            schedule: crate::strategy::Schedule::Cron("61 * * * *".to_string()),
        };
        assert!(matches!(
            engine.register(Trigger::new("bad", "Bad", cron)),
            Err(TriggerError::InvalidSchedule { .. })
        ));
        assert!(engine.list_triggers().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_trigger_uses_processing_instant() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(Trigger::new(
            "quarter",
            "Quarter hour",
            MatchStrategy::Scheduled {
                schedule: crate::strategy::Schedule::Cron("*/15 * * * *".to_string()),
            },
        ))?;

        let on = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let off = Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap();
        assert_eq!(engine.process_at(json!({}), on).await.len(), 1);
        assert!(engine.process_at(json!({}), off).await.is_empty());

        let summary = &engine.list_triggers()[0];
        assert_eq!(summary.fire_count, 1);
        assert_eq!(summary.last_fired, Some(on));
        Ok(())
    }

    struct Tally;

    #[async_trait]
    impl crate::action::ActionHandler for Tally {
        fn name(&self) -> &str {
            "tally"
        }

        async fn handle(&self, invocation: ActionInvocation<'_>) -> Result<Value, CapabilityError> {
            Ok(json!({
                "guardian": invocation.guardian,
                "matches": invocation.outcome.matches.len(),
                "label": invocation.parameters.get("label").cloned().unwrap_or(Value::Null),
            }))
        }
    }

    #[tokio::test]
    async fn test_custom_handler_sees_invocation() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(
            Trigger::new("custom", "Custom", MatchStrategy::keywords(&["story", "plot"]))
                .guardian("river-storyteller")
                .action(TriggerAction::custom(Arc::new(Tally)).parameter("label", json!("n"))),
        )?;

        let results = engine.process(json!({"text": "story and plot"})).await;
        let output = results[0].actions[0].output.clone().unwrap_or_default();
        assert_eq!(output["guardian"], "river-storyteller");
        assert_eq!(output["matches"], 2);
        assert_eq!(output["label"], "n");
        assert_eq!(results[0].actions[0].name, "custom");
        Ok(())
    }

    #[tokio::test]
    async fn test_workflow_action_without_orchestrator_fails() -> Result<(), TriggerError> {
        let (mut engine, _) = engine(MockGenerationProvider::new());
        engine.register(
            Trigger::new("wf", "Workflow", MatchStrategy::keywords(&["spell"]))
                .action(TriggerAction::workflow("spell-creation").critical()),
        )?;

        let results = engine.process(json!({"text": "new spell"})).await;
        assert!(!results[0].success);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("no workflow orchestrator"));
        Ok(())
    }
}
