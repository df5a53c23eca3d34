//! Name-keyed registries and the records they hold

use arcanea_core::{DurationMs, Timestamp, ValueMap};
use arcanea_dsl::{CharacterDecl, SpellDecl, WorldDecl};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// NAMED REGISTRY
// ============================================================================

/// Insertion-ordered map keyed by declared name.
///
/// Re-inserting a name replaces the entry in place and keeps its original
/// position.
#[derive(Debug, Clone)]
pub struct NamedRegistry<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> NamedRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the replaced value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in first-registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// AI-generated additions to a character. `None` means the slot's call failed
/// or enrichment was disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterEnrichment {
    pub personality_analysis: Option<Value>,
    pub portrait: Option<Value>,
    pub voice_profile: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(flatten)]
    pub declaration: CharacterDecl,
    pub enrichment: CharacterEnrichment,
}

/// AI-generated additions to a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldEnrichment {
    pub culture_details: Option<Value>,
    pub magic_systems: Option<Value>,
    pub historical_timeline: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    #[serde(flatten)]
    pub declaration: WorldDecl,
    pub enrichment: WorldEnrichment,
}

/// One successful spell cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub entity_name: String,
    pub args: ValueMap,
    pub result: Value,
    pub duration_ms: DurationMs,
    pub timestamp: Timestamp,
    pub provider_id: String,
    pub guardian_id: Option<String>,
}

/// Result of interpreting a program.
///
/// Counts are registry sizes after the program ran, so they include entities
/// registered by earlier programs in the same session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub success: bool,
    pub spells_registered: usize,
    pub characters_created: usize,
    pub worlds_built: usize,
    pub history: Vec<ExecutionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type SpellRegistry = NamedRegistry<SpellDecl>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut reg = NamedRegistry::new();
        assert_eq!(reg.insert("Ignite", 1), None);
        assert_eq!(reg.insert("Flow", 2), None);
        assert_eq!(reg.insert("Ignite", 3), Some(1));

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("Ignite"), Some(&3));
        assert_eq!(reg.names(), vec!["Ignite".to_string(), "Flow".to_string()]);
    }

    #[test]
    fn test_distinct_names_grow_by_one() {
        let mut reg = NamedRegistry::new();
        for (i, name) in ["A", "B", "A", "C", "B"].iter().enumerate() {
            reg.insert(*name, i);
        }
        assert_eq!(reg.len(), 3);
        assert!(reg.contains("C"));
        assert!(!reg.contains("D"));
        assert_eq!(reg.iter().map(|(_, v)| *v).collect::<Vec<_>>(), vec![2, 4, 3]);
    }
}
