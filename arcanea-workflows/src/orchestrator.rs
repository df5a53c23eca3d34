//! Workflow Orchestrator
//!
//! Runs registered workflow definitions phase by phase. Each phase receives
//! input resolved from earlier phases' outputs, dispatches to the generation
//! provider (or to a nested workflow), and merges its output into the run's
//! result map.

use crate::defaults::default_workflows;
use crate::definition::{CompletionHandler, PhaseAction, PhaseSpec, WorkflowDefinition};
use crate::input::{describe_input, resolve_inputs};
use crate::instance::{
    PhaseResult, WorkflowInstance, WorkflowRunResult, WorkflowStatus, WorkflowStatusReport,
    WorkflowSummary,
};
use crate::metrics::{MetricsRecorder, WorkflowMetrics};
use arcanea_core::{
    elapsed_ms, new_instance_id, now, ArcaneaConfig, InstanceId, ValueMap, WorkflowError,
};
use arcanea_events::{EventBus, RuntimeEvent};
use arcanea_llm::{ContentRequest, GenerationOptions, GenerationProvider, GenerationRequest};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock as TokioRwLock;
use tracing::{debug, error, info, warn};

/// Deepest chain of `workflow` phases a run may start.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Owns workflow definitions, live instances, and counters. Independent
/// orchestrators share nothing unless handed the same provider or bus.
pub struct WorkflowOrchestrator {
    config: ArcaneaConfig,
    provider: Arc<dyn GenerationProvider>,
    events: EventBus,
    definitions: HashMap<String, Arc<WorkflowDefinition>>,
    /// Registration order of definition ids
    order: Vec<String>,
    instances: TokioRwLock<HashMap<InstanceId, WorkflowInstance>>,
    metrics: MetricsRecorder,
}

impl WorkflowOrchestrator {
    /// Orchestrator with no workflows registered.
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            config: ArcaneaConfig::default(),
            provider,
            events: EventBus::default(),
            definitions: HashMap::new(),
            order: Vec::new(),
            instances: TokioRwLock::new(HashMap::new()),
            metrics: MetricsRecorder::default(),
        }
    }

    /// New orchestrator preloaded with the built-in workflows.
    pub fn with_default_workflows(provider: Arc<dyn GenerationProvider>) -> Self {
        let mut orchestrator = Self::new(provider);
        for definition in default_workflows() {
            orchestrator.register_workflow(definition);
        }
        orchestrator
    }

    pub fn with_config(mut self, config: ArcaneaConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ArcaneaConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    /// Register a definition, replacing any with the same id. Returns the id.
    pub fn register_workflow(&mut self, definition: WorkflowDefinition) -> String {
        let id = definition.id.clone();
        if self
            .definitions
            .insert(id.clone(), Arc::new(definition))
            .is_some()
        {
            debug!(workflow_id = %id, "Replaced workflow definition");
        } else {
            self.order.push(id.clone());
        }
        info!(workflow_id = %id, "Registered workflow");
        self.events.emit(RuntimeEvent::WorkflowRegistered {
            workflow_id: id.clone(),
        });
        id
    }

    pub fn get_workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.definitions.get(id).map(|d| d.as_ref())
    }

    /// Registered workflows in registration order.
    pub fn list_workflows(&self) -> Vec<WorkflowSummary> {
        self.order
            .iter()
            .filter_map(|id| self.definitions.get(id))
            .map(|d| WorkflowSummary {
                id: d.id.clone(),
                name: d.name.clone(),
                description: d.description.clone(),
                phases: d.phases.len(),
                orchestrator: d.orchestrator.clone(),
            })
            .collect()
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Run a registered workflow to completion.
    ///
    /// Only an unknown id is an `Err`; phase failures, timeouts, and
    /// cancellation are reported through the returned result's status.
    pub async fn start_workflow(
        &self,
        workflow_id: &str,
        context: Value,
    ) -> Result<WorkflowRunResult, WorkflowError> {
        self.run(workflow_id.to_string(), context, None, 0).await
    }

    fn run(
        &self,
        workflow_id: String,
        context: Value,
        parent: Option<InstanceId>,
        depth: usize,
    ) -> BoxFuture<'_, Result<WorkflowRunResult, WorkflowError>> {
        async move {
            let definition = self
                .definitions
                .get(&workflow_id)
                .cloned()
                .ok_or_else(|| WorkflowError::NotFound {
                    id: workflow_id.clone(),
                })?;

            let mut instance = WorkflowInstance {
                id: new_instance_id(),
                definition_id: definition.id.clone(),
                name: definition.name.clone(),
                context,
                status: WorkflowStatus::Running,
                current_phase: 0,
                total_phases: definition.phases.len(),
                phases: Vec::new(),
                results_by_key: ValueMap::new(),
                started_at: now(),
                ended_at: None,
                error: None,
                parent,
            };
            self.instances
                .write()
                .await
                .insert(instance.id, instance.clone());
            self.metrics.record_started();

            info!(
                instance_id = %instance.id,
                workflow_id = %definition.id,
                phases = definition.phases.len(),
                depth = depth,
                "Workflow started"
            );
            self.events.emit(RuntimeEvent::WorkflowStarted {
                instance_id: instance.id,
                workflow_id: definition.id.clone(),
            });

            for (index, phase) in definition.phases.iter().enumerate() {
                if self.is_cancelled(instance.id).await {
                    instance.status = WorkflowStatus::Cancelled;
                    instance.error = Some(
                        WorkflowError::Cancelled {
                            instance_id: instance.id,
                        }
                        .to_string(),
                    );
                    break;
                }
                instance.current_phase = index;

                let result = self.execute_phase(phase, &definition, &instance, depth).await;
                let success = result.success;
                let failure = result.error.clone();

                if success {
                    if let (Some(key), Some(output)) = (&phase.output_key, &result.output) {
                        instance.results_by_key.insert(key.clone(), output.clone());
                    }
                }
                instance.phases.push(result);

                self.events.emit(RuntimeEvent::PhaseCompleted {
                    instance_id: instance.id,
                    phase_id: phase.id.clone(),
                    success,
                });

                if !success {
                    let reason = failure.unwrap_or_else(|| "unknown error".to_string());
                    if phase.critical {
                        instance.status = WorkflowStatus::Failed;
                        instance.error = Some(
                            WorkflowError::PhaseFailed {
                                phase: phase.name.clone(),
                                reason,
                            }
                            .to_string(),
                        );
                        self.store(&instance).await;
                        break;
                    }
                    warn!(
                        instance_id = %instance.id,
                        phase = %phase.id,
                        error = %reason,
                        "Non-critical phase failed, continuing"
                    );
                }
                self.store(&instance).await;
            }

            if instance.status == WorkflowStatus::Running {
                instance.status = WorkflowStatus::Completed;
            }
            instance.ended_at = Some(now());
            let duration_ms = elapsed_ms(instance.started_at);
            self.store(&instance).await;

            match instance.status {
                WorkflowStatus::Completed => {
                    self.metrics.record_completed(duration_ms);
                    if let Some(handler) = definition.on_complete {
                        run_completion_handler(handler, &instance.results_by_key);
                    }
                    info!(
                        instance_id = %instance.id,
                        workflow_id = %definition.id,
                        duration_ms = duration_ms,
                        "Workflow completed"
                    );
                    self.events.emit(RuntimeEvent::WorkflowCompleted {
                        instance_id: instance.id,
                        workflow_id: definition.id.clone(),
                        duration_ms,
                    });
                }
                WorkflowStatus::Cancelled => {
                    self.metrics.record_cancelled();
                    info!(instance_id = %instance.id, "Workflow stopped after cancellation");
                }
                WorkflowStatus::Failed | WorkflowStatus::Running => {
                    self.metrics.record_failed();
                    let message = instance.error.clone().unwrap_or_default();
                    error!(
                        instance_id = %instance.id,
                        workflow_id = %definition.id,
                        error = %message,
                        "Workflow failed"
                    );
                    self.events.emit(RuntimeEvent::WorkflowFailed {
                        instance_id: instance.id,
                        workflow_id: definition.id.clone(),
                        error: message,
                    });
                }
            }

            Ok(WorkflowRunResult {
                success: instance.status == WorkflowStatus::Completed,
                instance_id: instance.id,
                workflow_id: definition.id.clone(),
                workflow_name: definition.name.clone(),
                status: instance.status,
                duration_ms,
                results_by_key: instance.results_by_key,
                phases: instance.phases,
                error: instance.error,
            })
        }
        .boxed()
    }

    async fn execute_phase(
        &self,
        phase: &PhaseSpec,
        definition: &WorkflowDefinition,
        instance: &WorkflowInstance,
        depth: usize,
    ) -> PhaseResult {
        let started = now();
        let input = resolve_inputs(phase, &instance.results_by_key);
        let agent = phase
            .guardian
            .clone()
            .unwrap_or_else(|| definition.orchestrator.clone());

        debug!(
            instance_id = %instance.id,
            phase = %phase.id,
            action = phase.action.kind(),
            agent = %agent,
            inputs = input.len(),
            "Executing phase"
        );

        let dispatch = self.dispatch(phase, &agent, &input, instance, depth);
        let outcome = match phase.timeout_ms {
            Some(timeout_ms) if self.config.enforce_phase_timeouts => {
                match tokio::time::timeout(Duration::from_millis(timeout_ms), dispatch).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        if matches!(phase.action, PhaseAction::Workflow { .. }) {
                            self.abandon_children(instance.id).await;
                        }
                        Err(WorkflowError::PhaseTimedOut {
                            phase: phase.id.clone(),
                            timeout_ms,
                        })
                    }
                }
            }
            _ => dispatch.await,
        };

        let duration_ms = elapsed_ms(started);
        match outcome {
            Ok(output) => PhaseResult {
                phase_id: phase.id.clone(),
                name: phase.name.clone(),
                success: true,
                guardian: agent,
                output: Some(output),
                error: None,
                input,
                duration_ms,
            },
            Err(e) => {
                warn!(phase = %phase.id, error = %e, "Phase failed");
                PhaseResult {
                    phase_id: phase.id.clone(),
                    name: phase.name.clone(),
                    success: false,
                    guardian: agent,
                    output: None,
                    error: Some(e.to_string()),
                    input,
                    duration_ms,
                }
            }
        }
    }

    async fn dispatch(
        &self,
        phase: &PhaseSpec,
        agent: &str,
        input: &ValueMap,
        instance: &WorkflowInstance,
        depth: usize,
    ) -> Result<Value, WorkflowError> {
        match &phase.action {
            PhaseAction::Generate => self.generate(phase, agent, input, &instance.context).await,
            PhaseAction::Enhance => {
                let response = self
                    .provider
                    .enhance(self.content_request(phase, agent, input, &instance.context))
                    .await?;
                response
                    .into_result(&self.config.default_text_provider)
                    .map_err(WorkflowError::from)
            }
            PhaseAction::Validate => {
                let response = self
                    .provider
                    .validate(self.content_request(phase, agent, input, &instance.context))
                    .await?;
                response
                    .into_result(&self.config.default_text_provider)
                    .map_err(WorkflowError::from)
            }
            PhaseAction::Parallel { guardians } => {
                let agents: Vec<&str> = if guardians.is_empty() {
                    vec![agent]
                } else {
                    guardians.iter().map(String::as_str).collect()
                };
                let outcomes = join_all(
                    agents
                        .iter()
                        .map(|guardian| self.generate(phase, guardian, input, &instance.context)),
                )
                .await;
                let results = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
                Ok(json!({ "parallel": true, "results": results }))
            }
            PhaseAction::Workflow { workflow_id } => {
                if depth + 1 >= MAX_NESTING_DEPTH {
                    return Err(WorkflowError::PhaseFailed {
                        phase: phase.id.clone(),
                        reason: format!("nesting deeper than {} workflows", MAX_NESTING_DEPTH),
                    });
                }
                let nested = self
                    .run(
                        workflow_id.clone(),
                        Value::Object(input.clone()),
                        Some(instance.id),
                        depth + 1,
                    )
                    .await?;
                if nested.success {
                    Ok(Value::Object(nested.results_by_key))
                } else {
                    Err(WorkflowError::PhaseFailed {
                        phase: phase.id.clone(),
                        reason: nested
                            .error
                            .unwrap_or_else(|| format!("nested workflow {} failed", workflow_id)),
                    })
                }
            }
        }
    }

    async fn generate(
        &self,
        phase: &PhaseSpec,
        agent: &str,
        input: &ValueMap,
        context: &Value,
    ) -> Result<Value, WorkflowError> {
        let request = GenerationRequest::new(
            self.config.default_text_provider.clone(),
            generation_prompt(phase, input, context),
        )
        .with_options(GenerationOptions {
            guardian: Some(agent.to_string()),
            ..Default::default()
        });
        let response = self.provider.generate_text(request).await?;
        response
            .into_result(&self.config.default_text_provider)
            .map_err(WorkflowError::from)
    }

    fn content_request(
        &self,
        phase: &PhaseSpec,
        agent: &str,
        input: &ValueMap,
        context: &Value,
    ) -> ContentRequest {
        let mut request = ContentRequest::new(phase.prompt.clone(), Value::Object(input.clone()))
            .with_guardian(agent)
            .with_context(context.clone());
        request.provider_id = Some(self.config.default_text_provider.clone());
        request
    }

    // ========================================================================
    // INSTANCE STATE
    // ========================================================================

    async fn is_cancelled(&self, instance_id: InstanceId) -> bool {
        self.instances
            .read()
            .await
            .get(&instance_id)
            .map(|i| i.status == WorkflowStatus::Cancelled)
            .unwrap_or(false)
    }

    /// Publish the run's progress. A pending cancellation stays visible
    /// until the run observes it.
    async fn store(&self, instance: &WorkflowInstance) {
        let mut instances = self.instances.write().await;
        let mut snapshot = instance.clone();
        let cancel_pending = instances
            .get(&instance.id)
            .map(|i| i.status == WorkflowStatus::Cancelled)
            .unwrap_or(false);
        if cancel_pending && snapshot.status == WorkflowStatus::Running {
            snapshot.status = WorkflowStatus::Cancelled;
        }
        instances.insert(instance.id, snapshot);
    }

    /// Fail nested runs left behind when a parent phase timed out.
    async fn abandon_children(&self, parent: InstanceId) {
        let mut instances = self.instances.write().await;
        let mut pending = vec![parent];
        while let Some(id) = pending.pop() {
            for child in instances.values_mut() {
                if child.parent == Some(id) && child.status == WorkflowStatus::Running {
                    child.status = WorkflowStatus::Failed;
                    child.ended_at = Some(now());
                    child.error = Some("parent phase timed out".to_string());
                    pending.push(child.id);
                }
            }
        }
    }

    pub async fn get_workflow_status(&self, instance_id: InstanceId) -> Option<WorkflowStatusReport> {
        self.instances
            .read()
            .await
            .get(&instance_id)
            .map(|i| i.report(now()))
    }

    /// Reports for every instance still running, oldest first.
    pub async fn list_active_workflows(&self) -> Vec<WorkflowStatusReport> {
        let at = now();
        let instances = self.instances.read().await;
        let mut active: Vec<&WorkflowInstance> = instances
            .values()
            .filter(|i| i.status == WorkflowStatus::Running)
            .collect();
        active.sort_by_key(|i| i.id);
        active.into_iter().map(|i| i.report(at)).collect()
    }

    /// Ask a running instance to stop before its next phase. Returns false
    /// when the instance is unknown or already finished.
    pub async fn cancel_workflow(&self, instance_id: InstanceId) -> bool {
        let mut instances = self.instances.write().await;
        match instances.get_mut(&instance_id) {
            Some(instance) if instance.status == WorkflowStatus::Running => {
                instance.status = WorkflowStatus::Cancelled;
                instance.ended_at = Some(now());
                info!(instance_id = %instance_id, "Workflow cancellation requested");
                self.events
                    .emit(RuntimeEvent::WorkflowCancelled { instance_id });
                true
            }
            _ => false,
        }
    }

    pub async fn metrics(&self) -> WorkflowMetrics {
        let active = self
            .instances
            .read()
            .await
            .values()
            .filter(|i| i.status == WorkflowStatus::Running)
            .count();
        self.metrics.snapshot(active, self.definitions.len())
    }
}

fn generation_prompt(phase: &PhaseSpec, input: &ValueMap, context: &Value) -> String {
    let mut prompt = phase.prompt.clone();
    let input = describe_input(input);
    if !input.is_empty() {
        prompt.push_str("\n\nInput: ");
        prompt.push_str(&input);
    }
    let has_context = match context {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    };
    if has_context {
        prompt.push_str("\n\nContext: ");
        prompt.push_str(&context.to_string());
    }
    prompt
}

fn run_completion_handler(handler: CompletionHandler, results: &ValueMap) {
    let key = handler.required_key();
    if results.contains_key(key) {
        info!(subject = handler.subject(), key = key, "Completion check passed");
    } else {
        warn!(subject = handler.subject(), key = key, "Completion check missing result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcanea_llm::{Capability, MockGenerationProvider};

    fn spell_orchestrator(mock: Arc<MockGenerationProvider>) -> WorkflowOrchestrator {
        WorkflowOrchestrator::with_default_workflows(mock)
    }

    #[tokio::test]
    async fn test_unknown_workflow_fails_before_work() {
        let mock = Arc::new(MockGenerationProvider::new());
        let orchestrator = spell_orchestrator(mock.clone());
        let err = orchestrator
            .start_workflow("missing", json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::NotFound {
                id: "missing".to_string()
            }
        );
        assert_eq!(mock.call_count(), 0);
        assert_eq!(orchestrator.metrics().await.workflows_started, 0);
    }

    #[tokio::test]
    async fn test_generate_prompt_carries_input_and_context() -> Result<(), WorkflowError> {
        let mock = Arc::new(
            MockGenerationProvider::new()
                .respond_when("Define spell concept", json!({"effect": "lightning lance"})),
        );
        let orchestrator = spell_orchestrator(mock.clone());
        orchestrator
            .start_workflow("spell-creation", json!({"element": "storm"}))
            .await?;

        let calls = mock.calls_for(Capability::GenerateText);
        assert_eq!(calls.len(), 4);
        assert!(calls[0].prompt.contains("\"element\":\"storm\""));
        assert_eq!(calls[0].guardian.as_deref(), Some("void-gazer"));
        assert!(calls[1].prompt.contains("lightning lance"));
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_instance_is_not_active() -> Result<(), WorkflowError> {
        let orchestrator =
            spell_orchestrator(Arc::new(MockGenerationProvider::new()));
        let run = orchestrator.start_workflow("spell-creation", json!({})).await?;

        let report = orchestrator
            .get_workflow_status(run.instance_id)
            .await
            .unwrap();
        assert_eq!(report.status, WorkflowStatus::Completed);
        assert_eq!(report.progress, 100.0);
        assert!(orchestrator.list_active_workflows().await.is_empty());
        assert!(!orchestrator.cancel_workflow(run.instance_id).await);
        Ok(())
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut orchestrator =
            WorkflowOrchestrator::with_default_workflows(Arc::new(MockGenerationProvider::new()));
        let mut replacement = orchestrator.get_workflow("world-creation").unwrap().clone();
        replacement.phases.truncate(1);
        orchestrator.register_workflow(replacement);

        let listed = orchestrator.list_workflows();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].id, "world-creation");
        assert_eq!(listed[0].phases, 1);
    }

    #[test]
    fn test_generation_prompt_omits_empty_parts() {
        let phase = PhaseSpec::generate("concept", "Concept", "Define it");
        assert_eq!(generation_prompt(&phase, &ValueMap::new(), &json!({})), "Define it");
        assert_eq!(
            generation_prompt(&phase, &ValueMap::new(), &json!("storm")),
            "Define it\n\nContext: \"storm\""
        );
    }
}
