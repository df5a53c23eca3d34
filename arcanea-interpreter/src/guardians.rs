//! Guardian personas and archetype routing tables

use serde::{Deserialize, Serialize};

/// A persona that biases the voice of a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: String,
    pub name: String,
    pub element: String,
    /// Resonance frequency in Hz
    pub frequency: u32,
}

impl Guardian {
    fn new(id: &str, name: &str, element: &str, frequency: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            element: element.to_string(),
            frequency,
        }
    }
}

/// The guardians every interpreter starts with.
pub fn default_guardians() -> Vec<Guardian> {
    vec![
        Guardian::new("draconia", "Draconia", "fire", 528),
        Guardian::new("lyssandria", "Lyssandria", "earth", 396),
        Guardian::new("maylinn", "Maylinn", "water", 639),
        Guardian::new("aiyami", "Aiyami", "void", 963),
    ]
}

/// Archetype tags → provider, checked in order.
const PROVIDER_RULES: &[(&[&str], &str)] = &[
    (&["narrative", "story"], "anthropic-claude"),
    (&["creative", "artistic"], "openai-gpt4"),
    (&["technical", "system"], "google-gemini"),
];

/// Archetype tags → guardian id, checked in order.
const GUARDIAN_RULES: &[(&[&str], &str)] = &[
    (&["fire", "transformation"], "draconia"),
    (&["earth", "foundation"], "lyssandria"),
    (&["water", "emotion"], "maylinn"),
    (&["void", "innovation"], "aiyami"),
];

fn first_rule<'a>(rules: &[(&[&str], &'a str)], tags: &[String]) -> Option<&'a str> {
    rules
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| tags.iter().any(|t| t == k)))
        .map(|(_, target)| *target)
}

/// Provider for a spell with these archetype tags.
///
/// Rules are checked in priority order, not tag order: a spell tagged
/// `[technical, story]` goes to the narrative provider.
pub fn select_provider<'a>(tags: &[String], fallback: &'a str) -> &'a str {
    first_rule(PROVIDER_RULES, tags).unwrap_or(fallback)
}

/// Guardian id for a spell with these archetype tags, if any rule applies.
pub fn select_guardian(tags: &[String]) -> Option<&'static str> {
    first_rule(GUARDIAN_RULES, tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_provider_priority() {
        assert_eq!(select_provider(&tags(&["story"]), "x"), "anthropic-claude");
        assert_eq!(select_provider(&tags(&["artistic"]), "x"), "openai-gpt4");
        assert_eq!(select_provider(&tags(&["system"]), "x"), "google-gemini");
        assert_eq!(
            select_provider(&tags(&["technical", "creative", "story"]), "x"),
            "anthropic-claude"
        );
        assert_eq!(select_provider(&tags(&["fire"]), "fallback"), "fallback");
    }

    #[test]
    fn test_guardian_priority() {
        assert_eq!(select_guardian(&tags(&["transformation"])), Some("draconia"));
        assert_eq!(select_guardian(&tags(&["emotion", "earth"])), Some("lyssandria"));
        assert_eq!(select_guardian(&tags(&["innovation"])), Some("aiyami"));
        assert_eq!(select_guardian(&tags(&["narrative"])), None);
        assert_eq!(select_guardian(&[]), None);
    }

    #[test]
    fn test_default_guardians() {
        let guardians = default_guardians();
        assert_eq!(guardians.len(), 4);
        assert_eq!(guardians[2].element, "water");
        assert_eq!(guardians[3].frequency, 963);
    }
}
