//! Example triggers shipped with the engine

use crate::action::TriggerAction;
use crate::strategy::MatchStrategy;
use crate::trigger::Trigger;

/// Creative Block Remover, Structure Helper, and Story Flow Assistant.
pub fn builtin_triggers() -> Vec<Trigger> {
    vec![
        Trigger::new(
            "creative-block-remover",
            "Creative Block Remover",
            MatchStrategy::keywords(&["stuck", "blocked", "can't start", "don't know"]),
        )
        .confidence(0.85)
        .guardian("dragon-forge")
        .action(TriggerAction::suggest(&["skill_block_remove"])),
        Trigger::new(
            "structure-helper",
            "Structure Helper",
            MatchStrategy::keywords(&["structure", "organize", "framework", "design"]),
        )
        .confidence(0.80)
        .guardian("crystal-architect")
        .action(TriggerAction::suggest(&["skill_structure", "skill_order"])),
        Trigger::new(
            "story-flow-assistant",
            "Story Flow Assistant",
            MatchStrategy::keywords(&["story", "narrative", "flow", "plot"]),
        )
        .confidence(0.80)
        .guardian("river-storyteller")
        .action(TriggerAction::suggest(&["skill_narrative"])),
    ]
}
