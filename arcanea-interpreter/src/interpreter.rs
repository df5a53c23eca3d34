//! Interpreter
//!
//! Registers declarations from parsed programs, performs AI enrichment of
//! characters and worlds, and casts spells through the generation provider.

use crate::environment::{Binding, Builtin, Environment};
use crate::guardians::{default_guardians, select_guardian, select_provider, Guardian};
use crate::registry::{
    CharacterEnrichment, CharacterRecord, ExecutionRecord, ExecutionSummary, NamedRegistry,
    SpellRegistry, WorldEnrichment, WorldRecord,
};
use arcanea_core::{
    elapsed_ms, now, substitute_placeholders, ArcaneaConfig, InterpreterError, ValueMap,
};
use arcanea_dsl::{ArcProgram, ArchetypeDecl, CharacterDecl, Declaration, SpellDecl, WorldDecl};
use arcanea_events::{EventBus, RuntimeEvent};
use arcanea_llm::{CapabilityResponse, GenerationOptions, GenerationProvider, GenerationRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const NARRATIVE_PROVIDER: &str = "anthropic-claude";
const CREATIVE_PROVIDER: &str = "openai-gpt4";
const TECHNICAL_PROVIDER: &str = "google-gemini";

/// Which generation call an enrichment slot makes.
enum EnrichmentCall {
    Text(GenerationRequest),
    Image(GenerationRequest),
}

/// Stages of a spell cast, logged at debug level.
#[derive(Debug, Clone, Copy)]
enum CastState {
    Pending,
    Substituting,
    Dispatched,
    Completed,
    Failed,
}

/// Session state for one `.arc` program set. Multiple interpreters share
/// nothing unless they are handed the same provider or event bus.
pub struct Interpreter {
    config: ArcaneaConfig,
    provider: Arc<dyn GenerationProvider>,
    events: EventBus,
    environment: Environment,
    spells: SpellRegistry,
    characters: NamedRegistry<CharacterRecord>,
    worlds: NamedRegistry<WorldRecord>,
    guardians: NamedRegistry<Guardian>,
    history: Vec<ExecutionRecord>,
}

impl Interpreter {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        let mut guardians = NamedRegistry::new();
        for guardian in default_guardians() {
            guardians.insert(guardian.id.clone(), guardian);
        }
        Self {
            config: ArcaneaConfig::default(),
            provider,
            events: EventBus::default(),
            environment: Environment::with_builtins(),
            spells: NamedRegistry::new(),
            characters: NamedRegistry::new(),
            worlds: NamedRegistry::new(),
            guardians,
            history: Vec::new(),
        }
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
    // PROGRAM EXECUTION
    // ========================================================================

    /// Register every declaration of `program` in file order.
    ///
    /// Enrichment failures never fail the program; they leave their slot empty.
    pub async fn interpret(&mut self, program: &ArcProgram) -> ExecutionSummary {
        for declaration in &program.declarations {
            match declaration {
                Declaration::Spell(spell) => self.register_spell(spell.clone()),
                Declaration::Character(character) => {
                    self.register_character(character.clone()).await;
                }
                Declaration::World(world) => {
                    self.register_world(world.clone()).await;
                }
                Declaration::Archetype(archetype) => self.define_archetype(archetype),
            }
        }

        ExecutionSummary {
            success: true,
            spells_registered: self.spells.len(),
            characters_created: self.characters.len(),
            worlds_built: self.worlds.len(),
            history: self.history.clone(),
            error: None,
        }
    }

    pub fn register_spell(&mut self, spell: SpellDecl) {
        let name = spell.name.clone();
        if self.spells.insert(name.clone(), spell).is_some() {
            debug!(spell = %name, "Spell re-declared, replacing previous definition");
        }
        info!(spell = %name, "Spell registered");
        self.events.emit(RuntimeEvent::SpellRegistered { name });
    }

    pub async fn register_character(&mut self, character: CharacterDecl) -> CharacterRecord {
        let enrichment = if self.config.enable_enrichment {
            self.enrich_character(&character).await
        } else {
            CharacterEnrichment::default()
        };
        let name = character.name.clone();
        let record = CharacterRecord {
            declaration: character,
            enrichment,
        };
        self.characters.insert(name.clone(), record.clone());
        info!(character = %name, "Character created");
        self.events.emit(RuntimeEvent::CharacterCreated { name });
        record
    }

    pub async fn register_world(&mut self, world: WorldDecl) -> WorldRecord {
        let enrichment = if self.config.enable_enrichment {
            self.enrich_world(&world).await
        } else {
            WorldEnrichment::default()
        };
        let name = world.name.clone();
        let record = WorldRecord {
            declaration: world,
            enrichment,
        };
        self.worlds.insert(name.clone(), record.clone());
        info!(world = %name, "World built");
        self.events.emit(RuntimeEvent::WorldBuilt { name });
        record
    }

    /// Bind the archetype's description under its name in the global scope.
    pub fn define_archetype(&mut self, archetype: &ArchetypeDecl) {
        let global = self.environment.global();
        self.environment.define(
            global,
            archetype.name.clone(),
            Value::String(archetype.description.clone()),
        );
        info!(archetype = %archetype.name, "Archetype defined");
        self.events.emit(RuntimeEvent::ArchetypeDefined {
            name: archetype.name.clone(),
        });
    }

    // ========================================================================
    // SPELL CASTING
    // ========================================================================

    /// Cast a registered spell with `args` substituted into its template.
    ///
    /// Fails with `UnknownSpell` before any work when the name is not
    /// registered. Provider failures are logged and propagated.
    pub async fn cast_spell(&mut self, name: &str, args: ValueMap) -> Result<Value, InterpreterError> {
        let spell = self
            .spells
            .get(name)
            .cloned()
            .ok_or_else(|| InterpreterError::UnknownSpell {
                name: name.to_string(),
            })?;
        let started = now();
        trace_state(name, CastState::Pending);

        trace_state(name, CastState::Substituting);
        let prompt = substitute_placeholders(&spell.implementation, &args);
        let provider_id =
            select_provider(&spell.archetypes, &self.config.default_text_provider).to_string();
        let guardian_id = select_guardian(&spell.archetypes).map(str::to_string);

        let mut extra = ValueMap::new();
        extra.insert(
            "spell_context".to_string(),
            json!({
                "spell_name": spell.name,
                "archetypes": spell.archetypes,
                "parameters": Value::Object(args.clone()),
            }),
        );
        let request = GenerationRequest::new(provider_id.clone(), prompt).with_options(
            GenerationOptions {
                temperature: Some(self.config.spell_temperature),
                max_tokens: Some(self.config.spell_max_tokens),
                guardian: guardian_id.clone(),
                extra,
            },
        );

        trace_state(name, CastState::Dispatched);
        let outcome = self
            .provider
            .generate_text(request)
            .await
            .and_then(|resp| resp.into_result(&provider_id));

        match outcome {
            Ok(result) => {
                trace_state(name, CastState::Completed);
                let duration_ms = elapsed_ms(started);
                self.history.push(ExecutionRecord {
                    entity_name: spell.name.clone(),
                    args,
                    result: result.clone(),
                    duration_ms,
                    timestamp: now(),
                    provider_id: provider_id.clone(),
                    guardian_id: guardian_id.clone(),
                });
                info!(spell = %name, provider = %provider_id, duration_ms, "Spell cast");
                self.events.emit(RuntimeEvent::SpellCast {
                    name: spell.name,
                    provider_id,
                    guardian_id,
                    duration_ms,
                });
                Ok(result)
            }
            Err(e) => {
                trace_state(name, CastState::Failed);
                error!(spell = %name, error = %e, "Spell failed");
                self.events.emit(RuntimeEvent::SpellFailed {
                    name: spell.name,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Handle for invoking a registered spell through its aliases.
    pub fn spell(&mut self, name: &str) -> Option<SpellHandle<'_>> {
        if self.spells.contains(name) {
            Some(SpellHandle {
                interpreter: self,
                name: name.to_string(),
            })
        } else {
            None
        }
    }

    // ========================================================================
    // BUILTINS
    // ========================================================================

    /// Call a function bound in the global scope with positional arguments.
    pub async fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, InterpreterError> {
        let global = self.environment.global();
        let builtin = match self.environment.get(global, name)? {
            Binding::Builtin(builtin) => *builtin,
            Binding::Value(_) => {
                return Err(InterpreterError::NotCallable {
                    name: name.to_string(),
                })
            }
        };
        self.call_builtin(builtin, args).await
    }

    pub async fn call_builtin(
        &mut self,
        builtin: Builtin,
        args: Vec<Value>,
    ) -> Result<Value, InterpreterError> {
        match builtin {
            Builtin::Cast => {
                let spell = string_arg(builtin, &args, 0)?;
                let spell_args = match args.get(1) {
                    None | Some(Value::Null) => ValueMap::new(),
                    Some(Value::Object(map)) => map.clone(),
                    Some(other) => {
                        return Err(InterpreterError::InvalidArgument {
                            builtin: builtin.name().to_string(),
                            reason: format!("expected an object of arguments, got {}", other),
                        })
                    }
                };
                self.cast_spell(&spell, spell_args).await
            }
            Builtin::Summon => {
                let guardian = string_arg(builtin, &args, 0)?;
                let task = optional_string_arg(builtin, &args, 1, "")?;
                self.summon(&guardian, &task).await
            }
            Builtin::Transform => {
                let object = args.first().cloned().unwrap_or(Value::Null);
                let transformation = string_arg(builtin, &args, 1)?;
                let prompt = format!(
                    "Transform this object through magical means: {}. Desired transformation: {}",
                    object, transformation
                );
                self.text_or_null(text_request(CREATIVE_PROVIDER, prompt, 0.9, 1200))
                    .await
            }
            Builtin::Envision => {
                let concept = string_arg(builtin, &args, 0)?;
                let medium = optional_string_arg(builtin, &args, 1, "text")?;
                if medium == "image" {
                    let request = self.image_request(concept, "concept-art");
                    self.image_or_null(request).await
                } else {
                    let prompt = format!("Envision and describe: {}", concept);
                    self.text_or_null(text_request(NARRATIVE_PROVIDER, prompt, 0.8, 800))
                        .await
                }
            }
            Builtin::Manifest => {
                let design = string_arg(builtin, &args, 0)?;
                let medium = optional_string_arg(builtin, &args, 1, "text")?;
                match medium.as_str() {
                    "image" => {
                        let request = self.image_request(design, "photorealistic");
                        self.image_or_null(request).await
                    }
                    "world" => {
                        let mut cosmology = ValueMap::new();
                        cosmology.insert("description".to_string(), Value::String(design));
                        let world = WorldDecl {
                            name: format!("World_{}", now().timestamp_millis()),
                            cosmology,
                            geography: ValueMap::new(),
                            cultures: Vec::new(),
                            history: Vec::new(),
                            line: 0,
                        };
                        let record = self.register_world(world).await;
                        Ok(serde_json::to_value(record).unwrap_or(Value::Null))
                    }
                    _ => {
                        let prompt = format!("Manifest into reality: {}", design);
                        self.text_or_null(text_request(CREATIVE_PROVIDER, prompt, 0.7, 1500))
                            .await
                    }
                }
            }
        }
    }

    /// Ask a guardian to approach a task in its own voice.
    pub async fn summon(&self, guardian: &str, task: &str) -> Result<Value, InterpreterError> {
        let guardian = self
            .guardians
            .get(&guardian.to_lowercase())
            .ok_or_else(|| InterpreterError::UnknownGuardian {
                guardian: guardian.to_string(),
            })?;
        let prompt = format!(
            "As {}, Guardian of {}, I approach this task: {}",
            guardian.name, guardian.element, task
        );
        let mut request = text_request(NARRATIVE_PROVIDER, prompt, 0.8, 1000);
        request.options.guardian = Some(guardian.id.clone());
        self.text_or_null(request).await
    }

    /// Payload on success, `Null` when the provider reports failure.
    /// Transport errors propagate.
    async fn text_or_null(&self, request: GenerationRequest) -> Result<Value, InterpreterError> {
        let response = self.provider.generate_text(request).await?;
        Ok(payload_or_null(response))
    }

    async fn image_or_null(&self, request: GenerationRequest) -> Result<Value, InterpreterError> {
        let response = self.provider.generate_image(request).await?;
        Ok(payload_or_null(response))
    }

    fn image_request(&self, prompt: String, style: &str) -> GenerationRequest {
        let mut extra = ValueMap::new();
        extra.insert("style".to_string(), json!(style));
        GenerationRequest::new(self.config.default_image_provider.clone(), prompt).with_options(
            GenerationOptions {
                extra,
                ..Default::default()
            },
        )
    }

    // ========================================================================
    // ENRICHMENT
    // ========================================================================

    async fn enrich_character(&self, character: &CharacterDecl) -> CharacterEnrichment {
        let elements = character.elemental_alignment.join(", ");
        let data = serde_json::to_string_pretty(&character.data).unwrap_or_default();
        let analysis_prompt = format!(
            "As a master character analyst, provide a deep psychological profile for this character:\n\n\
             Name: {}\nArchetype: {}\nElemental Alignment: {}\nData: {}\n\n\
             Provide analysis covering:\n\
             1. Core motivations and fears\n\
             2. Personality traits and behaviors\n\
             3. Relationship patterns\n\
             4. Character arc potential\n\
             5. Conflicts and growth opportunities",
            character.name, character.archetype, elements, data
        );
        let aligned = character.elemental_alignment.join(" and ");
        let portrait_prompt = format!(
            "Character portrait: {}, {} archetype, {} elemental alignment, fantasy character design, \
             detailed facial features, cinematic lighting",
            character.name, character.archetype, aligned
        );
        let voice_prompt = format!(
            "Describe the ideal voice characteristics for character: {}, {} archetype, {} alignment",
            character.name, character.archetype, aligned
        );

        let portrait = self.image_request(portrait_prompt, "character-design");
        CharacterEnrichment {
            personality_analysis: self
                .enrich(
                    &character.name,
                    "personality_analysis",
                    EnrichmentCall::Text(text_request(NARRATIVE_PROVIDER, analysis_prompt, 0.7, 1500)),
                )
                .await,
            portrait: self
                .enrich(&character.name, "portrait", EnrichmentCall::Image(portrait))
                .await,
            voice_profile: self
                .enrich(
                    &character.name,
                    "voice_profile",
                    EnrichmentCall::Text(text_request(CREATIVE_PROVIDER, voice_prompt, 0.6, 300)),
                )
                .await,
        }
    }

    async fn enrich_world(&self, world: &WorldDecl) -> WorldEnrichment {
        let culture_prompt = format!(
            "Generate detailed cultural information for world: {}. Include societies, customs, \
             languages, belief systems, and social structures based on: {}",
            world.name,
            Value::Object(world.cosmology.clone())
        );
        let magic_prompt = format!(
            "Design magical systems for world: {} that align with its cosmology and elemental \
             balance. Include laws, limitations, and practical applications.",
            world.name
        );
        let timeline_prompt = format!(
            "Create a historical timeline for world: {} with major events, eras, and turning \
             points that shaped its current state.",
            world.name
        );

        WorldEnrichment {
            culture_details: self
                .enrich(
                    &world.name,
                    "culture_details",
                    EnrichmentCall::Text(text_request(NARRATIVE_PROVIDER, culture_prompt, 0.8, 2000)),
                )
                .await,
            magic_systems: self
                .enrich(
                    &world.name,
                    "magic_systems",
                    EnrichmentCall::Text(text_request(CREATIVE_PROVIDER, magic_prompt, 0.7, 1500)),
                )
                .await,
            historical_timeline: self
                .enrich(
                    &world.name,
                    "historical_timeline",
                    EnrichmentCall::Text(text_request(TECHNICAL_PROVIDER, timeline_prompt, 0.6, 1800)),
                )
                .await,
        }
    }

    /// Run one enrichment call; any failure leaves the slot empty.
    async fn enrich(&self, entity: &str, slot: &str, call: EnrichmentCall) -> Option<Value> {
        let outcome = match call {
            EnrichmentCall::Text(request) => {
                let provider = request.provider_id.clone();
                self.provider
                    .generate_text(request)
                    .await
                    .and_then(|r| r.into_result(&provider))
            }
            EnrichmentCall::Image(request) => {
                let provider = request.provider_id.clone();
                self.provider
                    .generate_image(request)
                    .await
                    .and_then(|r| r.into_result(&provider))
            }
        };
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(entity = %entity, slot = %slot, error = %e, "Enrichment failed, leaving slot empty");
                self.events.emit(RuntimeEvent::EnrichmentFailed {
                    entity: entity.to_string(),
                    slot: slot.to_string(),
                    error: e.to_string(),
                });
                None
            }
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn get_spell(&self, name: &str) -> Option<&SpellDecl> {
        self.spells.get(name)
    }

    pub fn get_character(&self, name: &str) -> Option<&CharacterRecord> {
        self.characters.get(name)
    }

    pub fn get_world(&self, name: &str) -> Option<&WorldRecord> {
        self.worlds.get(name)
    }

    pub fn get_guardian(&self, id: &str) -> Option<&Guardian> {
        self.guardians.get(id)
    }

    pub fn list_spells(&self) -> Vec<String> {
        self.spells.names()
    }

    pub fn list_characters(&self) -> Vec<String> {
        self.characters.names()
    }

    pub fn list_worlds(&self) -> Vec<String> {
        self.worlds.names()
    }

    pub fn list_guardians(&self) -> Vec<String> {
        self.guardians.names()
    }

    pub fn execution_history(&self) -> &[ExecutionRecord] {
        &self.history
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }
}

/// A registered spell with its three equivalent invocation aliases.
pub struct SpellHandle<'a> {
    interpreter: &'a mut Interpreter,
    name: String,
}

impl SpellHandle<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn call(self, args: ValueMap) -> Result<Value, InterpreterError> {
        self.interpreter.cast_spell(&self.name, args).await
    }

    pub async fn cast(self, args: ValueMap) -> Result<Value, InterpreterError> {
        self.call(args).await
    }

    pub async fn invoke(self, args: ValueMap) -> Result<Value, InterpreterError> {
        self.call(args).await
    }
}

fn trace_state(spell: &str, state: CastState) {
    debug!(spell = %spell, state = ?state, "Spell cast state");
}

fn text_request(provider: &str, prompt: String, temperature: f64, max_tokens: u32) -> GenerationRequest {
    GenerationRequest::new(provider, prompt).with_options(GenerationOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    })
}

fn payload_or_null(response: CapabilityResponse) -> Value {
    if response.success {
        response.data.unwrap_or(Value::Null)
    } else {
        Value::Null
    }
}

fn string_arg(builtin: Builtin, args: &[Value], index: usize) -> Result<String, InterpreterError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(InterpreterError::InvalidArgument {
            builtin: builtin.name().to_string(),
            reason: format!("argument {} must be a string, got {}", index + 1, other),
        }),
        None => Err(InterpreterError::InvalidArgument {
            builtin: builtin.name().to_string(),
            reason: format!("missing argument {}", index + 1),
        }),
    }
}

fn optional_string_arg(
    builtin: Builtin,
    args: &[Value],
    index: usize,
    default: &str,
) -> Result<String, InterpreterError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(_) => string_arg(builtin, args, index),
    }
}
