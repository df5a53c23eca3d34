//! Lexer token types

use serde_json::Value;

// ============================================================================
// LEXER TYPES
// ============================================================================

/// Token kinds for the Arcanea DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structural symbols
    At,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    DoubleColon,
    Comma,
    Hash,
    Newline,

    // Declaration keywords
    Spell,
    Character,
    World,
    Archetype,

    // Clause keywords
    Description,
    Parameters,
    Example,
    Implementation,
    Data,
    Backstory,
    Relationships,
    ArcSpells,

    // Structural keywords (reserved, no declaration form yet)
    Primordial,
    Modifier,
    Direction,
    Pattern,

    // Literals
    String(String),
    Number(f64),
    Boolean(bool),
    Identifier(String),

    // Special
    Eof,
}

/// Coarse classification of a token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    Structural,
    Identifier,
    Keyword,
    StringLiteral,
    NumberLiteral,
    Newline,
    EndOfInput,
}

impl TokenKind {
    pub fn category(&self) -> TokenCategory {
        match self {
            TokenKind::At
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::LBracket
            | TokenKind::RBracket
            | TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::Colon
            | TokenKind::DoubleColon
            | TokenKind::Comma
            | TokenKind::Hash => TokenCategory::Structural,
            TokenKind::Newline => TokenCategory::Newline,
            TokenKind::String(_) => TokenCategory::StringLiteral,
            TokenKind::Number(_) => TokenCategory::NumberLiteral,
            TokenKind::Identifier(_) => TokenCategory::Identifier,
            TokenKind::Eof => TokenCategory::EndOfInput,
            _ => TokenCategory::Keyword,
        }
    }

    /// Whether this kind is a reserved word (including `true`/`false`).
    pub fn is_keyword(&self) -> bool {
        self.category() == TokenCategory::Keyword
    }
}

/// Map a bare word to its reserved token kind, if any.
///
/// Matching is case-sensitive.
pub fn keyword_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "spell" => TokenKind::Spell,
        "character" => TokenKind::Character,
        "world" => TokenKind::World,
        "archetype" => TokenKind::Archetype,
        "description" => TokenKind::Description,
        "parameters" => TokenKind::Parameters,
        "example" => TokenKind::Example,
        "implementation" => TokenKind::Implementation,
        "data" => TokenKind::Data,
        "backstory" => TokenKind::Backstory,
        "relationships" => TokenKind::Relationships,
        "arc_spells" => TokenKind::ArcSpells,
        "primordial" => TokenKind::Primordial,
        "modifier" => TokenKind::Modifier,
        "direction" => TokenKind::Direction,
        "pattern" => TokenKind::Pattern,
        "true" => TokenKind::Boolean(true),
        "false" => TokenKind::Boolean(false),
        _ => return None,
    };
    Some(kind)
}

/// Source location span. `start`/`end` are byte offsets into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind, raw text, and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    /// 1-based line the token starts on.
    pub fn line(&self) -> usize {
        self.span.line
    }

    /// Decoded literal value for string, number, and boolean tokens.
    pub fn literal(&self) -> Option<Value> {
        match &self.kind {
            TokenKind::String(s) => Some(Value::String(s.clone())),
            TokenKind::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number),
            TokenKind::Boolean(b) => Some(Value::Bool(*b)),
            _ => None,
        }
    }

    /// The bare word for identifiers and keywords, used for clause names.
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(s) => Some(s.as_str()),
            kind if kind.is_keyword() => Some(self.lexeme.as_str()),
            _ => None,
        }
    }
}
