//! Built-in workflow definitions

use crate::definition::{CompletionHandler, PhaseAction, PhaseSpec, WorkflowDefinition};

/// World, character, story, and spell creation pipelines.
pub fn default_workflows() -> Vec<WorkflowDefinition> {
    vec![
        world_creation(),
        character_creation(),
        story_creation(),
        spell_creation(),
    ]
}

fn world_creation() -> WorkflowDefinition {
    WorkflowDefinition {
        id: "world-creation".to_string(),
        name: "Complete World Building".to_string(),
        description: "Create a complete fictional world from scratch".to_string(),
        orchestrator: "crystal-architect".to_string(),
        phases: vec![
            PhaseSpec::generate(
                "foundation",
                "Cosmological Foundation",
                "Design the fundamental cosmology: physics, magic system, and universal laws",
            )
            .guardian("crystal-architect")
            .skill("skill_base_build")
            .output("cosmology")
            .timeout_ms(10_000),
            PhaseSpec::generate(
                "geography",
                "Geographical Design",
                "Create detailed geography: continents, climates, biomes, and landmarks",
            )
            .guardian("crystal-architect")
            .skill("skill_structure")
            .inputs(&["cosmology"])
            .output("geography")
            .timeout_ms(10_000),
            PhaseSpec::generate(
                "cultures",
                "Cultural Development",
                "Develop diverse cultures: societies, traditions, conflicts, and relationships",
            )
            .guardian("river-storyteller")
            .skill("skill_narrative")
            .inputs(&["cosmology", "geography.landmarks"])
            .output("cultures")
            .timeout_ms(15_000),
            PhaseSpec::generate(
                "history",
                "Historical Timeline",
                "Create a rich historical timeline: ages, events, wars, and evolution",
            )
            .guardian("ocean-memory")
            .skill("skill_narrative")
            .inputs(&["cosmology", "cultures.societies"])
            .output("history")
            .timeout_ms(15_000),
            PhaseSpec::generate(
                "magic",
                "Magic System Design",
                "Design detailed magic system: sources, limitations, costs, and applications",
            )
            .guardian("quantum-designer")
            .skill("skill_reality")
            .inputs(&["cosmology"])
            .output("magic_system")
            .timeout_ms(12_000),
        ],
        on_complete: Some(CompletionHandler::ValidateWorld),
    }
}

fn character_creation() -> WorkflowDefinition {
    WorkflowDefinition {
        id: "character-creation".to_string(),
        name: "Complete Character Development".to_string(),
        description: "Create a fully realized character with all dimensions".to_string(),
        orchestrator: "character-shaper".to_string(),
        phases: vec![
            PhaseSpec::generate(
                "archetype",
                "Archetype Definition",
                "Determine core archetype and role in the narrative",
            )
            .guardian("void-gazer")
            .skill("skill_vision")
            .output("archetype")
            .timeout_ms(5_000),
            PhaseSpec::generate(
                "foundation",
                "Foundation Traits",
                "Establish core personality traits, values, and foundation",
            )
            .guardian("mountain-builder")
            .skill("skill_base_build")
            .inputs(&["archetype.type"])
            .output("foundation")
            .timeout_ms(8_000),
            PhaseSpec::generate(
                "backstory",
                "Backstory Creation",
                "Create emotional backstory with formative experiences and wounds",
            )
            .guardian("ocean-memory")
            .skill("skill_narrative")
            .inputs(&["foundation.traits", "archetype.role"])
            .output("backstory")
            .timeout_ms(12_000),
            PhaseSpec::generate(
                "voice",
                "Voice Development",
                "Develop authentic voice: speech patterns, vocabulary, rhythm",
            )
            .guardian("whisper-messenger")
            .skill("skill_communicate")
            .inputs(&["foundation.traits", "backstory.experiences"])
            .output("voice")
            .timeout_ms(8_000),
            PhaseSpec::generate(
                "visual",
                "Visual Design",
                "Create visual appearance: features, style, distinctive markers",
            )
            .guardian("vision-artist")
            .skill("skill_vision")
            .inputs(&["foundation.traits", "archetype.type"])
            .output("visual")
            .timeout_ms(10_000),
            PhaseSpec::generate(
                "relationships",
                "Relationship Mapping",
                "Map key relationships: allies, enemies, mentors, loves",
            )
            .guardian("rain-singer")
            .skill("skill_relationship")
            .inputs(&["foundation.traits", "backstory.connections"])
            .output("relationships")
            .timeout_ms(10_000),
        ],
        on_complete: Some(CompletionHandler::ValidateCharacter),
    }
}

fn story_creation() -> WorkflowDefinition {
    WorkflowDefinition {
        id: "story-creation".to_string(),
        name: "Complete Story Development".to_string(),
        description: "Develop a complete story from concept to outline".to_string(),
        orchestrator: "story-weaver".to_string(),
        phases: vec![
            PhaseSpec::generate(
                "concept",
                "Concept Generation",
                "Generate unique story concept with hook and premise",
            )
            .guardian("void-gazer")
            .skill("skill_vision")
            .output("concept")
            .timeout_ms(8_000),
            PhaseSpec::new(
                "characters",
                "Character Ensemble",
                PhaseAction::Workflow {
                    workflow_id: "character-creation".to_string(),
                },
            )
            .guardian("character-shaper")
            .skill("skill_create")
            .output("characters")
            .timeout_ms(30_000),
            PhaseSpec::generate(
                "plot",
                "Plot Architecture",
                "Design plot structure: acts, turning points, climax, resolution",
            )
            .guardian("crystal-architect")
            .skill("skill_structure")
            .inputs(&["concept.premise", "characters.archetype"])
            .output("plot")
            .timeout_ms(12_000),
            PhaseSpec::generate(
                "scenes",
                "Scene Breakdown",
                "Break down into individual scenes with purposes and emotional beats",
            )
            .guardian("river-storyteller")
            .skill("skill_narrative")
            .inputs(&["plot.acts", "characters"])
            .output("scenes")
            .timeout_ms(15_000),
            PhaseSpec::generate(
                "themes",
                "Thematic Layering",
                "Weave in themes: symbolic elements, motifs, deeper meanings",
            )
            .guardian("mist-weaver")
            .skill("skill_narrative")
            .inputs(&["concept.themes", "plot.climax"])
            .output("themes")
            .timeout_ms(10_000),
        ],
        on_complete: Some(CompletionHandler::ValidateStory),
    }
}

fn spell_creation() -> WorkflowDefinition {
    WorkflowDefinition {
        id: "spell-creation".to_string(),
        name: "Arcane Spell Crafting".to_string(),
        description: "Create a magical spell with system integration".to_string(),
        orchestrator: "crystal-architect".to_string(),
        phases: vec![
            PhaseSpec::generate(
                "concept",
                "Spell Concept",
                "Define spell concept: effect, purpose, uniqueness",
            )
            .guardian("void-gazer")
            .skill("skill_vision")
            .output("concept")
            .timeout_ms(5_000),
            PhaseSpec::generate(
                "mechanics",
                "Mechanics Design",
                "Design mechanics: cost, limitations, requirements, duration",
            )
            .guardian("crystal-architect")
            .skill("skill_structure")
            .inputs(&["concept.effect"])
            .output("mechanics")
            .timeout_ms(8_000),
            PhaseSpec::generate(
                "lore",
                "Lore Integration",
                "Create lore: origin, famous users, legendary uses, cultural significance",
            )
            .guardian("river-storyteller")
            .skill("skill_narrative")
            .inputs(&["concept.effect", "mechanics.cost"])
            .output("lore")
            .timeout_ms(8_000),
            PhaseSpec::generate(
                "visual",
                "Visual Manifestation",
                "Describe visual appearance: casting, effects, aftermath",
            )
            .guardian("vision-artist")
            .skill("skill_vision")
            .inputs(&["concept.effect", "mechanics.components"])
            .output("visual")
            .timeout_ms(6_000),
        ],
        on_complete: Some(CompletionHandler::ValidateSpell),
    }
}
