//! AST type definitions

use arcanea_core::ValueMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// AST TYPES
// ============================================================================

/// Parse result: every declaration that parsed, plus every recovered error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArcProgram {
    pub declarations: Vec<Declaration>,
    pub errors: Vec<ParseError>,
}

impl ArcProgram {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Declaration {
    Spell(SpellDecl),
    Character(CharacterDecl),
    World(WorldDecl),
    Archetype(ArchetypeDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Spell(s) => &s.name,
            Declaration::Character(c) => &c.name,
            Declaration::World(w) => &w.name,
            Declaration::Archetype(a) => &a.name,
        }
    }

    /// 1-based line of the declaration's name token.
    pub fn line(&self) -> usize {
        match self {
            Declaration::Spell(s) => s.line,
            Declaration::Character(c) => c.line,
            Declaration::World(w) => w.line,
            Declaration::Archetype(a) => a.line,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Declaration::Spell(_) => "spell",
            Declaration::Character(_) => "character",
            Declaration::World(_) => "world",
            Declaration::Archetype(_) => "archetype",
        }
    }

    /// Copy with every source line (including embedded spells) set to zero.
    pub fn without_lines(&self) -> Declaration {
        match self {
            Declaration::Spell(s) => Declaration::Spell(s.without_lines()),
            Declaration::Character(c) => Declaration::Character(CharacterDecl {
                line: 0,
                arc_spells: c.arc_spells.iter().map(SpellDecl::without_lines).collect(),
                ..c.clone()
            }),
            Declaration::World(w) => Declaration::World(WorldDecl {
                line: 0,
                ..w.clone()
            }),
            Declaration::Archetype(a) => Declaration::Archetype(ArchetypeDecl {
                line: 0,
                ..a.clone()
            }),
        }
    }

    /// Structural equality ignoring source lines.
    pub fn eq_ignoring_lines(&self, other: &Declaration) -> bool {
        self.without_lines() == other.without_lines()
    }
}

/// `@spell` declaration: a named generation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellDecl {
    pub name: String,
    pub description: String,
    pub archetypes: Vec<String>,
    pub parameters: ValueMap,
    pub example: String,
    pub implementation: String,
    pub line: usize,
}

impl SpellDecl {
    fn without_lines(&self) -> SpellDecl {
        SpellDecl {
            line: 0,
            ..self.clone()
        }
    }
}

/// `@character` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDecl {
    pub name: String,
    pub archetype: String,
    pub elemental_alignment: Vec<String>,
    pub data: ValueMap,
    pub backstory: String,
    pub relationships: Vec<Value>,
    pub arc_spells: Vec<SpellDecl>,
    pub line: usize,
}

/// `@world` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDecl {
    pub name: String,
    pub cosmology: ValueMap,
    pub geography: ValueMap,
    pub cultures: Vec<Value>,
    pub history: Vec<Value>,
    pub line: usize,
}

/// `@archetype Name :: "description"` declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeDecl {
    pub name: String,
    pub description: String,
    pub line: usize,
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// A recovered error inside one declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Lexeme of the offending token
    pub token: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if !self.token.is_empty() {
            write!(f, " (near '{}')", self.token.escape_debug())?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
