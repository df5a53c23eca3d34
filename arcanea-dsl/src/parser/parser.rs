//! Parser implementation

use super::ast::*;
use super::literal::{decode_map_or_raw, decode_sequence_or_raw};
use crate::lexer::*;
use crate::pretty_printer::pretty_print;
use arcanea_core::{LexError, ValueMap};
use serde_json::Value;
use tracing::debug;

/// Clause words accepted inside `@spell`.
pub const SPELL_CLAUSES: &[&str] = &[
    "description",
    "archetype",
    "archetypes",
    "parameters",
    "example",
    "implementation",
];

/// Clause words accepted inside `@character`.
pub const CHARACTER_CLAUSES: &[&str] = &[
    "archetype",
    "elements",
    "elemental_alignment",
    "data",
    "backstory",
    "relationships",
    "arc_spells",
];

/// Clause words accepted inside `@world`.
pub const WORLD_CLAUSES: &[&str] = &["cosmology", "geography", "cultures", "history"];

fn is_clause_word(word: &str) -> bool {
    SPELL_CLAUSES.contains(&word) || CHARACTER_CLAUSES.contains(&word) || WORLD_CLAUSES.contains(&word)
}

// ============================================================================
// PARSER
// ============================================================================

/// Recursive-descent parser for `.arc` source.
///
/// Holds the source text alongside the tokens so structured literals can be
/// sliced verbatim.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Create a parser over tokens produced from `source`.
    pub fn new(source: &'src str, mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::Eof) {
            let end = source.len();
            let line = tokens.last().map(|t| t.span.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                span: Span {
                    start: end,
                    end,
                    line,
                    column: 1,
                },
            });
        }
        Self {
            source,
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Parse every declaration. Never fails: errors are collected and the
    /// parser resynchronizes after each one.
    pub fn parse(mut self) -> ArcProgram {
        let mut declarations = Vec::new();

        while !self.is_at_end() {
            if self.skip_comment() {
                continue;
            }
            if !self.check(&TokenKind::At) {
                self.advance();
                continue;
            }
            match self.parse_declaration() {
                Ok(Some(decl)) => declarations.push(decl),
                Ok(None) => {}
                Err(err) => {
                    debug!(line = err.line, message = %err.message, "Recovering from parse error");
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        ArcProgram {
            declarations,
            errors: self.errors,
        }
    }

    /// Parse one `@`-introduced top-level form.
    fn parse_declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        self.advance(); // @

        match self.current().kind {
            TokenKind::Spell => {
                self.advance();
                self.parse_spell_body().map(|s| Some(Declaration::Spell(s)))
            }
            TokenKind::Character => {
                self.advance();
                self.parse_character_body()
                    .map(|c| Some(Declaration::Character(c)))
            }
            TokenKind::World => {
                self.advance();
                self.parse_world_body().map(|w| Some(Declaration::World(w)))
            }
            TokenKind::Archetype if self.is_identifier_at(self.pos + 1) => {
                self.advance();
                self.parse_archetype_body()
                    .map(|a| Some(Declaration::Archetype(a)))
            }
            TokenKind::Primordial
            | TokenKind::Modifier
            | TokenKind::Direction
            | TokenKind::Pattern => {
                let message = format!("Unsupported declaration '@{}'", self.current().lexeme);
                Err(self.error(&message))
            }
            _ => match self.current().word().map(str::to_string) {
                Some(word) if is_clause_word(&word) => {
                    debug!(clause = %word, line = self.current().line(), "Skipping orphaned clause");
                    self.advance();
                    self.skip_clause_value()?;
                    Ok(None)
                }
                Some(word) => Err(self.error(&format!("Unknown declaration '@{}'", word))),
                None => Err(self.error("Expected declaration keyword after '@'")),
            },
        }
    }

    /// Parse a spell after `@spell`.
    pub(crate) fn parse_spell_body(&mut self) -> Result<SpellDecl, ParseError> {
        let name_token = self.current().clone();
        let name = self.expect_identifier("spell name after @spell")?;
        let mut spell = SpellDecl {
            name,
            description: String::new(),
            archetypes: Vec::new(),
            parameters: ValueMap::new(),
            example: String::new(),
            implementation: String::new(),
            line: name_token.line(),
        };
        let mut implementation = None;

        while let Some(clause) = self.next_clause(SPELL_CLAUSES) {
            match clause.as_str() {
                "description" => spell.description = self.expect_string("description string")?,
                "archetype" | "archetypes" => spell.archetypes = self.parse_word_list()?,
                "parameters" => spell.parameters = self.parse_map_block("@parameters")?,
                "example" => spell.example = self.expect_string("example string")?,
                _ => implementation = Some(self.expect_string("implementation string")?),
            }
        }

        match implementation {
            Some(template) => {
                spell.implementation = template;
                Ok(spell)
            }
            None => Err(self.error_at(
                &name_token,
                &format!("Spell '{}' is missing @implementation", spell.name),
            )),
        }
    }

    /// Parse a character after `@character`.
    fn parse_character_body(&mut self) -> Result<CharacterDecl, ParseError> {
        let name_token = self.current().clone();
        let name = self.expect_identifier("character name after @character")?;
        let mut character = CharacterDecl {
            name,
            archetype: String::new(),
            elemental_alignment: Vec::new(),
            data: ValueMap::new(),
            backstory: String::new(),
            relationships: Vec::new(),
            arc_spells: Vec::new(),
            line: name_token.line(),
        };

        while let Some(clause) = self.next_clause(CHARACTER_CLAUSES) {
            match clause.as_str() {
                "archetype" => character.archetype = self.expect_string_or_word("archetype name")?,
                "elements" | "elemental_alignment" => {
                    character.elemental_alignment = self.parse_word_list()?
                }
                "data" => character.data = self.parse_map_block("@data")?,
                "backstory" => character.backstory = self.expect_string("backstory string")?,
                "relationships" => {
                    character.relationships = self.parse_sequence_block("@relationships")?
                }
                _ => character.arc_spells = self.parse_arc_spells()?,
            }
        }

        Ok(character)
    }

    /// Parse a world after `@world`.
    fn parse_world_body(&mut self) -> Result<WorldDecl, ParseError> {
        let name_token = self.current().clone();
        let name = self.expect_identifier("world name after @world")?;
        let mut world = WorldDecl {
            name,
            cosmology: ValueMap::new(),
            geography: ValueMap::new(),
            cultures: Vec::new(),
            history: Vec::new(),
            line: name_token.line(),
        };

        while let Some(clause) = self.next_clause(WORLD_CLAUSES) {
            match clause.as_str() {
                "cosmology" => world.cosmology = self.parse_map_block("@cosmology")?,
                "geography" => world.geography = self.parse_map_block("@geography")?,
                "cultures" => world.cultures = self.parse_sequence_block("@cultures")?,
                _ => world.history = self.parse_sequence_block("@history")?,
            }
        }

        Ok(world)
    }

    /// Parse `Name :: "description"` after `@archetype`.
    fn parse_archetype_body(&mut self) -> Result<ArchetypeDecl, ParseError> {
        let name_token = self.current().clone();
        let name = self.expect_identifier("archetype name after @archetype")?;
        self.expect(&TokenKind::DoubleColon, "'::' after archetype name")?;
        let description = self.expect_string("archetype description after '::'")?;
        Ok(ArchetypeDecl {
            name,
            description,
            line: name_token.line(),
        })
    }

    /// Parse `[ @spell A ... @spell B ... ]`.
    fn parse_arc_spells(&mut self) -> Result<Vec<SpellDecl>, ParseError> {
        self.expect(&TokenKind::LBracket, "'[' after @arc_spells")?;
        let mut spells = Vec::new();

        loop {
            self.skip_trivia();
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            if self.check(&TokenKind::RBracket) {
                self.advance();
                return Ok(spells);
            }
            if self.check(&TokenKind::At) && self.kind_at(self.pos + 1) == Some(&TokenKind::Spell) {
                self.advance();
                self.advance();
                spells.push(self.parse_spell_body()?);
                continue;
            }
            return Err(self.error("Expected @spell or ']' inside @arc_spells"));
        }
    }

    // ========================================================================
    // CLAUSE VALUES
    // ========================================================================

    /// If the next non-trivia tokens are `@` + an allowed clause word,
    /// consume them and return the word.
    fn next_clause(&mut self, allowed: &[&str]) -> Option<String> {
        self.skip_trivia();
        if !self.check(&TokenKind::At) {
            return None;
        }
        let next = self.tokens.get(self.pos + 1)?;
        let word = next.word()?;
        if !allowed.contains(&word) {
            return None;
        }
        // `@archetype Name :: "..."` starts a new declaration.
        if next.kind == TokenKind::Archetype
            && self.is_identifier_at(self.pos + 2)
            && self.kind_at(self.pos + 3) == Some(&TokenKind::DoubleColon)
        {
            return None;
        }
        let word = word.to_string();
        self.advance();
        self.advance();
        Some(word)
    }

    /// Parse `[a, b, "c"]` into words.
    fn parse_word_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(&TokenKind::LBracket, "'[' to open list")?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            if self.check(&TokenKind::RBracket) {
                self.advance();
                return Ok(items);
            }
            if self.is_at_end() {
                return Err(self.error("Unterminated list, expected ']'"));
            }
            items.push(self.expect_string_or_word("list item")?);
            self.skip_trivia();
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else if !self.check(&TokenKind::RBracket) {
                return Err(self.error("Expected ',' or ']' in list"));
            }
        }
    }

    fn parse_map_block(&mut self, clause: &str) -> Result<ValueMap, ParseError> {
        if !self.check(&TokenKind::LBrace) {
            return Err(self.error(&format!("Expected '{{' after {}", clause)));
        }
        let inner = self.extract_block(&TokenKind::LBrace, &TokenKind::RBrace)?;
        Ok(decode_map_or_raw(inner))
    }

    fn parse_sequence_block(&mut self, clause: &str) -> Result<Vec<Value>, ParseError> {
        if !self.check(&TokenKind::LBracket) {
            return Err(self.error(&format!("Expected '[' after {}", clause)));
        }
        let inner = self.extract_block(&TokenKind::LBracket, &TokenKind::RBracket)?;
        Ok(decode_sequence_or_raw(inner))
    }

    /// Consume a delimited block and return the source text between the
    /// delimiters. Depth counts only `open`/`close` tokens; string tokens are
    /// opaque, so delimiters inside strings never count.
    fn extract_block(&mut self, open: &TokenKind, close: &TokenKind) -> Result<&'src str, ParseError> {
        let open_token = self.current().clone();
        self.advance();
        let mut depth = 1usize;

        while !self.is_at_end() {
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth -= 1;
                if depth == 0 {
                    let end = self.current().span.start;
                    self.advance();
                    return Ok(self.source.get(open_token.span.end..end).unwrap_or(""));
                }
            }
            self.advance();
        }

        Err(self.error_at(&open_token, "Unterminated structured literal"))
    }

    /// Skip the value of an orphaned clause.
    fn skip_clause_value(&mut self) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::LBrace => {
                self.extract_block(&TokenKind::LBrace, &TokenKind::RBrace)?;
            }
            TokenKind::LBracket => {
                self.extract_block(&TokenKind::LBracket, &TokenKind::RBracket)?;
            }
            TokenKind::At | TokenKind::Newline | TokenKind::Eof => {}
            _ => self.advance(),
        }
        Ok(())
    }

    // ========================================================================
    // RECOVERY
    // ========================================================================

    /// Panic-mode recovery: stop just after a newline or at the next `@`.
    fn synchronize(&mut self) {
        if self.check(&TokenKind::At) {
            return;
        }
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Newline {
                return;
            }
            if self.check(&TokenKind::At) {
                return;
            }
            self.advance();
        }
    }

    /// Skip newlines and `#` line comments.
    fn skip_trivia(&mut self) {
        loop {
            if self.check(&TokenKind::Newline) {
                self.advance();
            } else if !self.skip_comment() {
                return;
            }
        }
    }

    /// Skip a `#` comment through the end of its line.
    fn skip_comment(&mut self) -> bool {
        if !self.check(&TokenKind::Hash) {
            return false;
        }
        while !self.is_at_end() && !self.check(&TokenKind::Newline) {
            self.advance();
        }
        true
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn kind_at(&self, index: usize) -> Option<&TokenKind> {
        self.tokens.get(index).map(|t| &t.kind)
    }

    fn is_identifier_at(&self, index: usize) -> bool {
        matches!(self.kind_at(index), Some(TokenKind::Identifier(_)))
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("Expected {}", what)))
        }
    }

    pub(crate) fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error(&format!("Expected {}", what))),
        }
    }

    pub(crate) fn expect_string(&mut self, what: &str) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error(&format!("Expected {}", what))),
        }
    }

    /// A quoted string, an identifier, or a keyword used as a bare word.
    fn expect_string_or_word(&mut self, what: &str) -> Result<String, ParseError> {
        let token = self.current();
        let value = match &token.kind {
            TokenKind::String(s) => Some(s.clone()),
            _ => token.word().map(str::to_string),
        };
        match value {
            Some(v) => {
                self.advance();
                Ok(v)
            }
            None => Err(self.error(&format!("Expected {}", what))),
        }
    }

    pub(crate) fn error(&self, msg: &str) -> ParseError {
        self.error_at(self.current(), msg)
    }

    fn error_at(&self, token: &Token, msg: &str) -> ParseError {
        ParseError {
            message: msg.to_string(),
            line: token.span.line,
            column: token.span.column,
            token: token.lexeme.clone(),
        }
    }
}

// ============================================================================
// CONVENIENCE FUNCTIONS
// ============================================================================

/// Lex strictly and parse `.arc` source.
pub fn parse(source: &str) -> Result<ArcProgram, LexError> {
    parse_with_mode(source, LexMode::Strict)
}

/// Lex with the given mode and parse `.arc` source.
pub fn parse_with_mode(source: &str, mode: LexMode) -> Result<ArcProgram, LexError> {
    let tokens = Lexer::with_mode(source, mode).tokenize()?;
    Ok(Parser::new(source, tokens).parse())
}

/// Parse and pretty-print `.arc` source (for round-trip testing).
pub fn round_trip(source: &str) -> Result<String, LexError> {
    let program = parse(source)?;
    Ok(pretty_print(&program.declarations))
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
