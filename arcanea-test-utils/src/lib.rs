//! Arcanea Test Utilities
//!
//! Shared test infrastructure for the Arcanea workspace:
//! - Proptest generators for declarations and trigger inputs
//! - Failing and shared mock providers
//! - `.arc` source fixtures and declaration builders
//! - Assertions over parse results and emitted events

pub use arcanea_core::{
    ArcaneaConfig, CapabilityError, InterpreterError, StructuredValue, ValueMap,
};
pub use arcanea_dsl::{ArcProgram, CharacterDecl, Declaration, SpellDecl, WorldDecl};
pub use arcanea_events::{EventBus, RuntimeEvent};
pub use arcanea_llm::{Capability, MockGenerationProvider, RecordedCall};

use arcanea_llm::{CapabilityResponse, ContentRequest, GenerationProvider, GenerationRequest};
use async_trait::async_trait;
use std::sync::Arc;

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Provider whose every call fails at the transport level.
#[derive(Debug, Clone, Default)]
pub struct FailingProvider {
    reason: String,
}

impl FailingProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail(&self, provider: &str) -> Result<CapabilityResponse, CapabilityError> {
        Err(CapabilityError::RequestFailed {
            provider: provider.to_string(),
            reason: self.reason.clone(),
        })
    }
}

#[async_trait]
impl GenerationProvider for FailingProvider {
    async fn generate_text(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.fail(&request.provider_id)
    }

    async fn generate_image(
        &self,
        request: GenerationRequest,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.fail(&request.provider_id)
    }

    async fn validate(&self, request: ContentRequest) -> Result<CapabilityResponse, CapabilityError> {
        self.fail(request.provider_id.as_deref().unwrap_or("validator"))
    }
}

/// Wrap a mock so the test keeps a handle for inspecting calls.
pub fn shared(mock: MockGenerationProvider) -> Arc<MockGenerationProvider> {
    Arc::new(mock)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Arcanea inputs.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    // === Names and Text ===

    /// Declaration names. Capitalized, so never a reserved word.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9_]{0,10}"
    }

    /// Archetype or element tags, drawn from the words the routers know.
    pub fn arb_tag() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "narrative", "story", "creative", "artistic", "technical", "system", "fire",
            "water", "earth", "void", "emotion", "foundation", "innovation", "epic",
        ])
        .prop_map(str::to_string)
    }

    /// Free text without placeholder syntax.
    pub fn arb_prose() -> impl Strategy<Value = String> {
        "[a-z ,.]{0,40}"
    }

    // === Structured Values ===

    pub fn arb_json_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i32>().prop_map(Value::from),
            "[a-zA-Z ]{0,10}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
        ]
    }

    pub fn arb_value_map() -> impl Strategy<Value = ValueMap> {
        prop::collection::btree_map("[a-z]{1,8}", arb_json_leaf(), 0..5)
            .prop_map(|m| m.into_iter().collect())
    }

    // === Declarations ===

    pub fn arb_spell_decl() -> impl Strategy<Value = SpellDecl> {
        (
            arb_name(),
            arb_prose(),
            prop::collection::vec(arb_tag(), 0..4),
            arb_value_map(),
            arb_prose(),
        )
            .prop_map(|(name, description, archetypes, parameters, implementation)| SpellDecl {
                name,
                description,
                archetypes,
                parameters,
                example: String::new(),
                implementation,
                line: 1,
            })
    }

    /// Spell declarations drawn from a small name pool, so repeats are common.
    pub fn arb_spell_batch() -> impl Strategy<Value = Vec<SpellDecl>> {
        let name = prop::sample::select(vec!["Ignite", "Flow", "Anchor", "Drift", "Echo"]);
        prop::collection::vec(
            (name, arb_spell_decl()).prop_map(|(name, mut spell)| {
                spell.name = name.to_string();
                spell
            }),
            0..12,
        )
    }

    // === Trigger Inputs ===

    /// Distinct lowercase keywords.
    pub fn arb_keyword_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::btree_set("[a-z]{3,8}", 1..6).prop_map(|s| s.into_iter().collect())
    }

    /// Filler text that cannot contain any `[a-z]` keyword.
    pub fn arb_filler() -> impl Strategy<Value = String> {
        "[0-9 .,!]{0,20}"
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built sources and declarations.

    use super::*;
    use serde_json::{json, Value};

    /// A library exercising every declaration kind.
    pub const SAMPLE_LIBRARY: &str = r#"# Sample library
@archetype Mentor :: "Guides the hero across the threshold"

@spell Ignite
  @description "Kindle a creative spark"
  @archetypes [creative, fire]
  @parameters {"element": "fire", "intensity": 3}
  @example "cast Ignite with element=storm"
  @implementation "Summon ${element} at intensity ${intensity}"

@spell Chronicle
  @archetypes [narrative]
  @implementation "Write the chronicle of ${subject}"

@character Seraphine
  @archetype "Mentor"
  @elements [water, earth]
  @data {"age": 312, "title": "Keeper of Tides"}
  @backstory "Once a river spirit."
  @relationships [{"name": "Kael", "bond": "student"}]
  @arc_spells [
    @spell Tidecall
      @implementation "Call the tide for ${reason}"
  ]

@world Emberfall
  @cosmology {"suns": 2, "moons": ["Ash", "Cinder"]}
  @geography {"regions": ["Glass Desert"]}
  @cultures [{"name": "Flamewardens"}]
  @history ["The Kindling", "The Long Dusk"]
"#;

    /// A source with one broken declaration between two good ones.
    pub const MALFORMED_LIBRARY: &str = r#"@spell First
  @implementation "one"
@spell Broken
  @description "has no implementation"
@character Wren
  @data {not json}
"#;

    pub fn spell_decl(name: &str, tags: &[&str], implementation: &str) -> SpellDecl {
        SpellDecl {
            name: name.to_string(),
            description: String::new(),
            archetypes: tags.iter().map(|t| t.to_string()).collect(),
            parameters: ValueMap::new(),
            example: String::new(),
            implementation: implementation.to_string(),
            line: 0,
        }
    }

    pub fn character_decl(name: &str, archetype: &str, elements: &[&str]) -> CharacterDecl {
        CharacterDecl {
            name: name.to_string(),
            archetype: archetype.to_string(),
            elemental_alignment: elements.iter().map(|e| e.to_string()).collect(),
            data: ValueMap::new(),
            backstory: String::new(),
            relationships: Vec::new(),
            arc_spells: Vec::new(),
            line: 0,
        }
    }

    pub fn world_decl(name: &str, cosmology: Value) -> WorldDecl {
        WorldDecl {
            name: name.to_string(),
            cosmology: match cosmology {
                Value::Object(map) => map,
                _ => ValueMap::new(),
            },
            geography: ValueMap::new(),
            cultures: Vec::new(),
            history: Vec::new(),
            line: 0,
        }
    }

    /// A trigger context carrying only `text`.
    pub fn text_context(text: &str) -> Value {
        json!({ "text": text })
    }

    /// Config with enrichment off, for tests that count provider calls.
    pub fn quiet_config() -> ArcaneaConfig {
        ArcaneaConfig {
            enable_enrichment: false,
            ..Default::default()
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over parse results and event streams.

    use super::*;
    use tokio::sync::broadcast;

    #[track_caller]
    pub fn assert_clean_program(program: &ArcProgram) {
        assert!(
            program.errors.is_empty(),
            "Expected no parse errors, got: {:?}",
            program.errors
        );
    }

    #[track_caller]
    pub fn assert_parse_error_at(program: &ArcProgram, line: usize) {
        assert!(
            program.errors.iter().any(|e| e.line == line),
            "Expected a parse error at line {}, got: {:?}",
            line,
            program.errors
        );
    }

    /// Assert the declaration names, in order.
    #[track_caller]
    pub fn assert_declaration_names(program: &ArcProgram, expected: &[&str]) {
        let names: Vec<&str> = program.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, expected, "Declaration names differ");
    }

    /// Everything currently buffered on a subscription, in order.
    pub fn drain_events(rx: &mut broadcast::Receiver<RuntimeEvent>) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// The `event_type()` of every buffered event, in order.
    pub fn drain_event_types(rx: &mut broadcast::Receiver<RuntimeEvent>) -> Vec<&'static str> {
        drain_events(rx).iter().map(RuntimeEvent::event_type).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sample_library_parses_cleanly() {
        let program = arcanea_dsl::parse(fixtures::SAMPLE_LIBRARY).unwrap();
        assertions::assert_clean_program(&program);
        assertions::assert_declaration_names(
            &program,
            &["Mentor", "Ignite", "Chronicle", "Seraphine", "Emberfall"],
        );
    }

    #[test]
    fn test_malformed_library_recovers() {
        let program = arcanea_dsl::parse(fixtures::MALFORMED_LIBRARY).unwrap();
        assertions::assert_parse_error_at(&program, 3);
        assertions::assert_declaration_names(&program, &["First", "Wren"]);
        match &program.declarations[1] {
            Declaration::Character(c) => {
                assert_eq!(c.data.get("raw"), Some(&serde_json::json!("not json")));
            }
            other => panic!("Expected character, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_provider_always_errors() {
        let provider = FailingProvider::new("offline");
        let err = provider
            .generate_text(GenerationRequest::new("p", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::RequestFailed { .. }));
    }

    #[tokio::test]
    async fn test_drain_events_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(RuntimeEvent::SpellRegistered { name: "A".into() });
        bus.emit(RuntimeEvent::WorldBuilt { name: "B".into() });
        assert_eq!(
            assertions::drain_event_types(&mut rx),
            vec!["SpellRegistered", "WorldBuilt"]
        );
    }

    proptest! {
        #[test]
        fn prop_spell_names_are_not_keywords(spell in generators::arb_spell_decl()) {
            prop_assert!(arcanea_dsl::keyword_kind(&spell.name).is_none());
        }

        #[test]
        fn prop_filler_never_contains_keywords(
            keywords in generators::arb_keyword_list(),
            filler in generators::arb_filler(),
        ) {
            for kw in &keywords {
                prop_assert!(!filler.contains(kw.as_str()));
            }
        }
    }
}
