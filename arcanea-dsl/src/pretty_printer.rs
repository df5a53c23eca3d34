//! Pretty printer for Arcanea declarations
//!
//! Renders declarations back to canonical `.arc` text. Empty clauses are
//! omitted; parsing the output yields the same declarations up to line
//! numbers.

use crate::lexer::keyword_kind;
use crate::parser::*;
use arcanea_core::ValueMap;
use serde_json::Value;

/// Pretty-print declarations as `.arc` source, separated by blank lines.
pub fn pretty_print(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(pretty_print_declaration)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn pretty_print_declaration(decl: &Declaration) -> String {
    match decl {
        Declaration::Spell(s) => pretty_print_spell(s, 0),
        Declaration::Character(c) => pretty_print_character(c),
        Declaration::World(w) => pretty_print_world(w),
        Declaration::Archetype(a) => format!(
            "@archetype {} :: \"{}\"\n",
            a.name,
            escape_string(&a.description)
        ),
    }
}

fn indent_str(level: usize) -> String {
    "  ".repeat(level)
}

fn pretty_print_spell(spell: &SpellDecl, indent: usize) -> String {
    let ind = indent_str(indent);
    let inner = indent_str(indent + 1);
    let mut output = format!("{}@spell {}\n", ind, spell.name);

    if !spell.description.is_empty() {
        output.push_str(&format!(
            "{}@description \"{}\"\n",
            inner,
            escape_string(&spell.description)
        ));
    }
    if !spell.archetypes.is_empty() {
        output.push_str(&format!("{}@archetypes {}\n", inner, word_list(&spell.archetypes)));
    }
    if !spell.parameters.is_empty() {
        output.push_str(&format!("{}@parameters {}\n", inner, map_literal(&spell.parameters)));
    }
    if !spell.example.is_empty() {
        output.push_str(&format!(
            "{}@example \"{}\"\n",
            inner,
            escape_string(&spell.example)
        ));
    }
    output.push_str(&format!(
        "{}@implementation \"{}\"\n",
        inner,
        escape_string(&spell.implementation)
    ));
    output
}

fn pretty_print_character(character: &CharacterDecl) -> String {
    let inner = indent_str(1);
    let mut output = format!("@character {}\n", character.name);

    if !character.archetype.is_empty() {
        output.push_str(&format!(
            "{}@archetype \"{}\"\n",
            inner,
            escape_string(&character.archetype)
        ));
    }
    if !character.elemental_alignment.is_empty() {
        output.push_str(&format!(
            "{}@elements {}\n",
            inner,
            word_list(&character.elemental_alignment)
        ));
    }
    if !character.data.is_empty() {
        output.push_str(&format!("{}@data {}\n", inner, map_literal(&character.data)));
    }
    if !character.backstory.is_empty() {
        output.push_str(&format!(
            "{}@backstory \"{}\"\n",
            inner,
            escape_string(&character.backstory)
        ));
    }
    if !character.relationships.is_empty() {
        output.push_str(&format!(
            "{}@relationships {}\n",
            inner,
            sequence_literal(&character.relationships)
        ));
    }
    if !character.arc_spells.is_empty() {
        output.push_str(&format!("{}@arc_spells [\n", inner));
        for spell in &character.arc_spells {
            output.push_str(&pretty_print_spell(spell, 2));
        }
        output.push_str(&format!("{}]\n", inner));
    }
    output
}

fn pretty_print_world(world: &WorldDecl) -> String {
    let inner = indent_str(1);
    let mut output = format!("@world {}\n", world.name);

    if !world.cosmology.is_empty() {
        output.push_str(&format!("{}@cosmology {}\n", inner, map_literal(&world.cosmology)));
    }
    if !world.geography.is_empty() {
        output.push_str(&format!("{}@geography {}\n", inner, map_literal(&world.geography)));
    }
    if !world.cultures.is_empty() {
        output.push_str(&format!("{}@cultures {}\n", inner, sequence_literal(&world.cultures)));
    }
    if !world.history.is_empty() {
        output.push_str(&format!("{}@history {}\n", inner, sequence_literal(&world.history)));
    }
    output
}

/// `[a, b, "two words"]`: bare when the item lexes as a plain identifier.
fn word_list(items: &[String]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| {
            if is_plain_identifier(item) {
                item.clone()
            } else {
                format!("\"{}\"", escape_string(item))
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && keyword_kind(s).is_none()
}

fn map_literal(map: &ValueMap) -> String {
    Value::Object(map.clone()).to_string()
}

fn sequence_literal(items: &[Value]) -> String {
    Value::Array(items.to_vec()).to_string()
}

pub(crate) fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spell(name: &str) -> SpellDecl {
        SpellDecl {
            name: name.to_string(),
            description: String::new(),
            archetypes: Vec::new(),
            parameters: ValueMap::new(),
            example: String::new(),
            implementation: "Cast ${element}".to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_pretty_print_minimal_spell() {
        let out = pretty_print(&[Declaration::Spell(spell("Ignite"))]);
        assert_eq!(out, "@spell Ignite\n  @implementation \"Cast ${element}\"\n");
    }

    #[test]
    fn test_pretty_print_quotes_keyword_tags() {
        let mut s = spell("Weave");
        s.archetypes = vec!["creative".to_string(), "pattern".to_string(), "two words".to_string()];
        let out = pretty_print_declaration(&Declaration::Spell(s));
        assert!(out.contains("@archetypes [creative, \"pattern\", \"two words\"]"));
    }

    #[test]
    fn test_pretty_print_world_literals() {
        let mut cosmology = ValueMap::new();
        cosmology.insert("suns".to_string(), json!(2));
        let world = WorldDecl {
            name: "Aether".to_string(),
            cosmology,
            geography: ValueMap::new(),
            cultures: vec![json!({"name": "Tidefolk"})],
            history: Vec::new(),
            line: 1,
        };
        let out = pretty_print_declaration(&Declaration::World(world));
        assert_eq!(
            out,
            "@world Aether\n  @cosmology {\"suns\":2}\n  @cultures [{\"name\":\"Tidefolk\"}]\n"
        );
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a \"b\"\n\\"), "a \\\"b\\\"\\n\\\\");
    }
}
