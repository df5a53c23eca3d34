//! Property-Based Tests for `.arc` Round-Trip
//!
//! Property: for any declarations, pretty-printing then parsing yields the
//! same declarations, ignoring source line numbers.
//!
//! This validates:
//! - The printer escapes every string it emits
//! - Structured literals survive JSON re-encoding
//! - Reserved words used as tags are quoted

use arcanea_core::ValueMap;
use arcanea_dsl::{parse, pretty_print, ArchetypeDecl, CharacterDecl, Declaration, SpellDecl, WorldDecl};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// ARBITRATORS
// ============================================================================

/// Capitalized names never collide with the lowercase reserved words.
fn arb_name() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9_]{0,10}"
}

/// Free text including quotes, backslashes, newlines, and delimiters.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.!?\"\\\\\n${}@#\\[\\]]{0,30}"
}

fn arb_tag() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z_]{0,8}",
        Just("pattern".to_string()),
        Just("true".to_string()),
        Just("two words".to_string()),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(2, 12, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_map() -> impl Strategy<Value = ValueMap> {
    prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..4)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_spell() -> impl Strategy<Value = SpellDecl> {
    (
        arb_name(),
        arb_text(),
        prop::collection::vec(arb_tag(), 0..4),
        arb_map(),
        arb_text(),
        arb_text(),
    )
        .prop_map(
            |(name, description, archetypes, parameters, example, implementation)| SpellDecl {
                name,
                description,
                archetypes,
                parameters,
                example,
                implementation,
                line: 0,
            },
        )
}

fn arb_character() -> impl Strategy<Value = CharacterDecl> {
    (
        arb_name(),
        arb_text(),
        prop::collection::vec(arb_tag(), 0..3),
        arb_map(),
        arb_text(),
        prop::collection::vec(arb_value(), 0..3),
        prop::collection::vec(arb_spell(), 0..3),
    )
        .prop_map(
            |(name, archetype, elemental_alignment, data, backstory, relationships, arc_spells)| {
                CharacterDecl {
                    name,
                    archetype,
                    elemental_alignment,
                    data,
                    backstory,
                    relationships,
                    arc_spells,
                    line: 0,
                }
            },
        )
}

fn arb_world() -> impl Strategy<Value = WorldDecl> {
    (
        arb_name(),
        arb_map(),
        arb_map(),
        prop::collection::vec(arb_value(), 0..3),
        prop::collection::vec(arb_value(), 0..3),
    )
        .prop_map(|(name, cosmology, geography, cultures, history)| WorldDecl {
            name,
            cosmology,
            geography,
            cultures,
            history,
            line: 0,
        })
}

fn arb_declaration() -> impl Strategy<Value = Declaration> {
    prop_oneof![
        arb_spell().prop_map(Declaration::Spell),
        arb_character().prop_map(Declaration::Character),
        arb_world().prop_map(Declaration::World),
        (arb_name(), arb_text()).prop_map(|(name, description)| {
            Declaration::Archetype(ArchetypeDecl {
                name,
                description,
                line: 0,
            })
        }),
    ]
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_round_trip_declarations(decls in prop::collection::vec(arb_declaration(), 0..5)) {
        let source = pretty_print(&decls);
        let program = parse(&source).expect("printed source must lex");

        prop_assert!(program.errors.is_empty(), "errors: {:?}\nsource:\n{}", program.errors, source);
        prop_assert_eq!(program.declarations.len(), decls.len());
        for (original, reparsed) in decls.iter().zip(&program.declarations) {
            prop_assert_eq!(original.without_lines(), reparsed.without_lines());
        }
    }

    #[test]
    fn prop_printing_is_idempotent(decls in prop::collection::vec(arb_declaration(), 0..4)) {
        let once = pretty_print(&decls);
        let program = parse(&once).expect("printed source must lex");
        let twice = pretty_print(&program.declarations);
        prop_assert_eq!(once, twice);
    }
}
