//! Phase input resolution

use crate::definition::PhaseSpec;
use arcanea_core::{lookup_path, ValueMap};
use serde_json::Value;

/// Build a phase's input from its parameters and its references into
/// earlier results.
///
/// `a.b.c` sets `input[a]` to `results[a].b.c`; a bare `a` sets it to
/// `results[a]`. References that do not resolve are left out.
pub fn resolve_inputs(phase: &PhaseSpec, results: &ValueMap) -> ValueMap {
    let mut input = phase.parameters.clone();
    for reference in &phase.inputs {
        let (key, rest) = match reference.split_once('.') {
            Some((key, rest)) => (key, rest),
            None => (reference.as_str(), ""),
        };
        let resolved = results.get(key).and_then(|root| lookup_path(root, rest));
        if let Some(value) = resolved {
            input.insert(key.to_string(), value.clone());
        }
    }
    input
}

/// Render input for a prompt, empty when there is nothing to show.
pub(crate) fn describe_input(input: &ValueMap) -> String {
    if input.is_empty() {
        String::new()
    } else {
        Value::Object(input.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results() -> ValueMap {
        json!({
            "foundation": {"cosmology": {"suns": 2}, "laws": ["entropy"]},
            "geography": "a single continent"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_dotted_reference_resolves_subkey() {
        let phase = PhaseSpec::generate("g", "G", "").inputs(&["foundation.cosmology"]);
        let input = resolve_inputs(&phase, &results());
        assert_eq!(input.get("foundation"), Some(&json!({"suns": 2})));
    }

    #[test]
    fn test_missing_references_are_omitted() {
        let phase = PhaseSpec::generate("g", "G", "").inputs(&[
            "foundation.magic",
            "history.ages",
            "geography.landmarks",
        ]);
        let input = resolve_inputs(&phase, &results());
        assert!(input.is_empty());
    }

    #[test]
    fn test_bare_and_nested_references() {
        let mut phase = PhaseSpec::generate("g", "G", "").inputs(&["geography", "foundation.laws.0"]);
        phase.parameters.insert("tone".to_string(), json!("epic"));
        let input = resolve_inputs(&phase, &results());
        assert_eq!(input.get("geography"), Some(&json!("a single continent")));
        assert_eq!(input.get("foundation"), Some(&json!("entropy")));
        assert_eq!(input.get("tone"), Some(&json!("epic")));
        assert_eq!(describe_input(&ValueMap::new()), "");
    }
}
