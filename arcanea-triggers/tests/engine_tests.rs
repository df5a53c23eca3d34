//! Integration tests for the trigger engine

use arcanea_core::{ArcaneaConfig, TriggerError};
use arcanea_events::EventBus;
use arcanea_test_utils::assertions::drain_event_types;
use arcanea_test_utils::fixtures::text_context;
use arcanea_test_utils::{
    generators, shared, Capability, FailingProvider, MockGenerationProvider,
};
use arcanea_triggers::{
    ActionKind, ConditionExpr, FieldCondition, MatchStrategy, Trigger, TriggerAction,
    TriggerEngine,
};
use arcanea_workflows::WorkflowOrchestrator;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn builtin_engine() -> TriggerEngine {
    TriggerEngine::new(shared(MockGenerationProvider::new()))
        .with_builtin_triggers()
        .unwrap()
}

#[tokio::test]
async fn test_creative_block_remover_fires_on_stuck_writer() {
    let mut engine = builtin_engine();
    let results = engine
        .process(text_context("I'm stuck and don't know how to begin"))
        .await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.trigger_name, "Creative Block Remover");
    assert_eq!(result.guardian, "dragon-forge");
    assert!((result.confidence - 0.85 * 2.0 / 4.0).abs() < 1e-9);
    assert_eq!(result.matches, vec!["stuck", "don't know"]);

    let output = result.actions[0].output.clone().unwrap();
    assert_eq!(output["count"], 6);
    assert_eq!(output["suggestions"][0]["text"], "Ignite creative fire...");
    assert_eq!(
        output["suggestions"][3]["text"],
        "Try the 5-minute free-write technique"
    );
}

#[tokio::test]
async fn test_structure_helper_combines_skill_templates() {
    let mut engine = builtin_engine();
    let results = engine
        .process(text_context("Help me organize the structure of my design"))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].guardian, "crystal-architect");
    assert!((results[0].confidence - 0.6).abs() < 1e-9);
    let output = results[0].actions[0].output.clone().unwrap();
    assert_eq!(output["count"], 9);
}

#[tokio::test]
async fn test_several_triggers_fire_in_registration_order() {
    let mut engine = builtin_engine();
    let results = engine
        .process(text_context("I'm blocked on the story structure"))
        .await;

    let names: Vec<&str> = results.iter().map(|r| r.trigger_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Creative Block Remover", "Structure Helper", "Story Flow Assistant"]
    );
    assert_eq!(engine.stats().triggers_fired, 3);
    assert_eq!(engine.stats().registered_triggers, 3);
}

#[tokio::test]
async fn test_events_follow_registration_and_execution() -> Result<(), TriggerError> {
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let mut engine = TriggerEngine::new(Arc::new(FailingProvider::new("offline")))
        .with_events(events);

    engine.register(
        Trigger::new("gen", "Generator", MatchStrategy::keywords(&["write"]))
            .guardian("whisper-messenger")
            .action(TriggerAction::new(ActionKind::Generate).critical()),
    )?;
    engine.set_trigger_state("gen", true);
    let results = engine.process(text_context("write me a verse")).await;

    assert!(!results[0].success);
    assert!(results[0].error.as_deref().unwrap_or_default().contains("offline"));
    assert_eq!(
        drain_event_types(&mut rx),
        vec!["TriggerRegistered", "TriggerStateChanged", "TriggerFailed", "TriggerExecuted"]
    );

    engine.unregister("gen");
    assert_eq!(drain_event_types(&mut rx), vec!["TriggerUnregistered"]);
    Ok(())
}

#[tokio::test]
async fn test_content_actions_reach_the_provider() -> Result<(), TriggerError> {
    let mock = shared(MockGenerationProvider::new());
    let mut engine = TriggerEngine::new(mock.clone()).with_config(ArcaneaConfig {
        default_text_provider: "local-model".to_string(),
        ..Default::default()
    });
    engine.register(
        Trigger::new("polish", "Polish", MatchStrategy::pattern(r"^draft:"))
            .action(
                TriggerAction::new(ActionKind::Enhance)
                    .parameter("enhancement_type", json!("vivid")),
            )
            .action(
                TriggerAction::new(ActionKind::Transform)
                    .parameter("target_format", json!("haiku")),
            )
            .action(TriggerAction::new(ActionKind::Validate).parameter("rules", json!("lore"))),
    )?;

    let results = engine.process(text_context("Draft: the river remembers")).await;
    assert!(results[0].success);
    assert_eq!(results[0].actions.len(), 3);

    let enhance = mock.calls_for(Capability::Enhance);
    assert_eq!(enhance.len(), 1);
    assert_eq!(enhance[0].provider_id, "local-model");
    assert!(enhance[0].prompt.starts_with("vivid"));
    assert_eq!(mock.calls_for(Capability::Transform).len(), 1);
    assert_eq!(mock.calls_for(Capability::Validate).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_generate_prefers_prompt_parameter() -> Result<(), TriggerError> {
    let mock = shared(MockGenerationProvider::new());
    let mut engine = TriggerEngine::new(mock.clone());
    engine.register(
        Trigger::new("muse", "Muse", MatchStrategy::keywords(&["dream"]))
            .action(
                TriggerAction::new(ActionKind::Generate)
                    .parameter("prompt", json!("Describe a dream")),
            )
            .action(TriggerAction::new(ActionKind::Generate)),
    )?;

    engine.process(text_context("a dream of glass")).await;

    let calls = mock.calls_for(Capability::GenerateText);
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prompt, "Describe a dream");
    assert_eq!(calls[1].prompt, "a dream of glass");
    assert_eq!(calls[0].guardian.as_deref(), Some("void-gazer"));
    Ok(())
}

#[tokio::test]
async fn test_composite_strategy_over_context_fields() -> Result<(), TriggerError> {
    let mut engine = TriggerEngine::new(shared(MockGenerationProvider::new()));
    engine.register(Trigger::new(
        "night-owl",
        "Night owl",
        MatchStrategy::Composite {
            expr: ConditionExpr::All(vec![
                ConditionExpr::Field(FieldCondition::equals("session.mode", json!("draft"))),
                ConditionExpr::Not(Box::new(ConditionExpr::Field(FieldCondition::exists(
                    "session.deadline",
                )))),
            ]),
        },
    ))?;

    let relaxed = json!({"session": {"mode": "draft"}});
    let rushed = json!({"session": {"mode": "draft", "deadline": "friday"}});
    assert_eq!(engine.process(relaxed).await.len(), 1);
    assert!(engine.process(rushed).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_workflow_action_runs_default_workflow() -> Result<(), TriggerError> {
    let mock = shared(MockGenerationProvider::new());
    let orchestrator = Arc::new(WorkflowOrchestrator::with_default_workflows(mock.clone()));
    let mut engine = TriggerEngine::new(mock.clone()).with_orchestrator(orchestrator.clone());
    engine.register(
        Trigger::new("spellcraft", "Spellcraft", MatchStrategy::keywords(&["spell"]))
            .guardian("crystal-architect")
            .action(TriggerAction::workflow("spell-creation").named("Design spell")),
    )?;

    let results = engine.process(text_context("Invent a spell of tides")).await;
    let action = &results[0].actions[0];
    assert!(action.success);
    assert_eq!(action.name, "Design spell");

    let output = action.output.clone().unwrap();
    assert_eq!(output["workflow_id"], "spell-creation");
    assert_eq!(output["phases"].as_array().map(Vec::len), Some(4));
    assert_eq!(orchestrator.metrics().await.workflows_completed, 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_workflow_is_an_action_failure() -> Result<(), TriggerError> {
    let mock = shared(MockGenerationProvider::new());
    let orchestrator = Arc::new(WorkflowOrchestrator::new(mock.clone()));
    let mut engine = TriggerEngine::new(mock).with_orchestrator(orchestrator);
    engine.register(
        Trigger::new("ghost", "Ghost", MatchStrategy::keywords(&["ghost"]))
            .action(TriggerAction::workflow("ghost-story"))
            .action(TriggerAction::suggest(&["skill_narrative"])),
    )?;

    let results = engine.process(text_context("a ghost")).await;
    assert!(results[0].success);
    assert!(!results[0].actions[0].success);
    assert!(results[0].actions[1].success);
    Ok(())
}

proptest! {
    #[test]
    fn prop_keyword_confidence_never_drops_as_matches_grow(
        keywords in generators::arb_keyword_list(),
        filler in generators::arb_filler(),
        base in 0.1f64..1.0,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let keyword_refs: Vec<&str> = keywords.iter().map(String::as_str).collect();
        let mut engine = TriggerEngine::new(shared(MockGenerationProvider::new()));
        engine
            .register(
                Trigger::new("k", "K", MatchStrategy::keywords(&keyword_refs)).confidence(base),
            )
            .unwrap();

        let mut previous = 0.0;
        for included in 1..=keywords.len() {
            let text = format!("{}{}", filler, keywords[..included].join(&filler));
            let results = runtime.block_on(engine.process(text_context(&text)));
            prop_assert_eq!(results.len(), 1);
            let confidence = results[0].confidence;
            prop_assert!(confidence >= previous);
            prop_assert!(confidence <= 1.0);
            previous = confidence;
        }
        prop_assert!((previous - base).abs() < 1e-9);
    }
}
