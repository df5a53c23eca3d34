//! Lexer implementation

use super::token::*;
use arcanea_core::LexError;
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

// ============================================================================
// LEXER IMPLEMENTATION
// ============================================================================

/// How the lexer treats characters outside the token grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    /// Reject with [`LexError::UnexpectedCharacter`].
    #[default]
    Strict,
    /// Skip and keep scanning.
    Lenient,
}

/// Lexer for the Arcanea DSL.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
    mode: LexMode,
}

impl<'a> Lexer<'a> {
    /// Create a strict lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self::with_mode(source, LexMode::Strict)
    }

    /// Create a lexer that skips unrecognized characters.
    pub fn lenient(source: &'a str) -> Self {
        Self::with_mode(source, LexMode::Lenient)
    }

    pub fn with_mode(source: &'a str, mode: LexMode) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
            mode,
        }
    }

    /// Tokenize the entire source. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the source.
    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();

            let start_pos = self.pos;
            let start_line = self.line;
            let start_col = self.column;

            let kind = match self.peek_char() {
                None => TokenKind::Eof,
                Some(c) => match c {
                    '@' => self.single(TokenKind::At),
                    '{' => self.single(TokenKind::LBrace),
                    '}' => self.single(TokenKind::RBrace),
                    '[' => self.single(TokenKind::LBracket),
                    ']' => self.single(TokenKind::RBracket),
                    '(' => self.single(TokenKind::LParen),
                    ')' => self.single(TokenKind::RParen),
                    ',' => self.single(TokenKind::Comma),
                    '#' => self.single(TokenKind::Hash),
                    '\n' => self.single(TokenKind::Newline),

                    ':' => {
                        self.advance();
                        if self.peek_char() == Some(':') {
                            self.advance();
                            TokenKind::DoubleColon
                        } else {
                            TokenKind::Colon
                        }
                    }

                    '-' if self.peek_next_char().is_some_and(|c| c.is_ascii_digit()) => {
                        self.advance();
                        self.scan_number_from_pos(start_pos)
                    }

                    '"' => self.scan_string(start_line, start_col)?,

                    c if c.is_ascii_digit() => self.scan_number_from_pos(start_pos),

                    c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),

                    c => {
                        if self.mode == LexMode::Strict {
                            return Err(LexError::UnexpectedCharacter {
                                ch: c,
                                line: start_line,
                                column: start_col,
                            });
                        }
                        debug!(ch = %c, line = start_line, column = start_col, "Skipping unrecognized character");
                        self.advance();
                        continue;
                    }
                },
            };

            return Ok(Token {
                kind,
                lexeme: self.source[start_pos..self.pos].to_string(),
                span: Span {
                    start: start_pos,
                    end: self.pos,
                    line: start_line,
                    column: start_col,
                },
            });
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let ident = &self.source[start..self.pos];
        keyword_kind(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }

    /// Scan a string literal with escape sequences. Strings may span lines.
    fn scan_string(&mut self, line: usize, column: usize) -> Result<TokenKind, LexError> {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek_char() {
                None => return Err(LexError::UnterminatedString { line, column }),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => {
                            self.advance();
                            value.push('\n');
                        }
                        Some('t') => {
                            self.advance();
                            value.push('\t');
                        }
                        Some('\\') => {
                            self.advance();
                            value.push('\\');
                        }
                        Some('"') => {
                            self.advance();
                            value.push('"');
                        }
                        Some('r') => {
                            self.advance();
                            value.push('\r');
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(TokenKind::String(value))
    }

    /// Scan digits with an optional fractional part. `start` may point at a
    /// leading `-` that was already consumed.
    fn scan_number_from_pos(&mut self, start: usize) -> TokenKind {
        self.consume_digits();

        if self.peek_char() == Some('.') && self.peek_next_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
        }

        let text = &self.source[start..self.pos];
        // Digits with at most one interior dot always parse.
        TokenKind::Number(text.parse::<f64>().unwrap_or(0.0))
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip spaces, tabs, and carriage returns. Newlines are tokens.
    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.peek_char() {
            self.advance();
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next_char(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((i, c)) = self.chars.next() {
            self.pos = i + c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(c)
        } else {
            None
        }
    }
}

/// Tokenize with the strict lexer.
pub fn scan(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

/// Tokenize with the lenient lexer.
pub fn scan_lenient(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::lenient(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lexer_declaration_keywords() {
        let k = kinds("spell character world archetype");
        assert_eq!(
            k,
            vec![
                TokenKind::Spell,
                TokenKind::Character,
                TokenKind::World,
                TokenKind::Archetype,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lexer_clause_and_structural_keywords() {
        let k = kinds("description parameters example implementation data backstory relationships arc_spells primordial modifier direction pattern");
        assert!(matches!(k[0], TokenKind::Description));
        assert!(matches!(k[7], TokenKind::ArcSpells));
        assert!(matches!(k[8], TokenKind::Primordial));
        assert!(matches!(k[11], TokenKind::Pattern));
        assert!(k[..12].iter().all(|k| k.is_keyword()));
    }

    #[test]
    fn test_lexer_keywords_are_case_sensitive() {
        assert_eq!(kinds("Spell")[0], TokenKind::Identifier("Spell".to_string()));
    }

    #[test]
    fn test_lexer_delimiters_and_double_colon() {
        let k = kinds("@ { } [ ] ( ) : :: , #");
        assert_eq!(
            &k[..11],
            &[
                TokenKind::At,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::DoubleColon,
                TokenKind::Comma,
                TokenKind::Hash,
            ]
        );
    }

    #[test]
    fn test_lexer_newlines_are_tokens_and_count_lines() {
        let tokens = scan("@spell\nIgnite\n").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Spell);
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[2].line(), 1);
        assert_eq!(tokens[3].line(), 2);
        assert_eq!(tokens[4].kind, TokenKind::Newline);
        assert_eq!(tokens[5].kind, TokenKind::Eof);
        assert_eq!(tokens[5].line(), 3);
    }

    #[test]
    fn test_lexer_string_literals() {
        let tokens = scan(r#""hello" "say \"hi\"\n""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("hello".to_string()));
        assert_eq!(tokens[1].kind, TokenKind::String("say \"hi\"\n".to_string()));
        assert_eq!(tokens[0].lexeme, "\"hello\"");
        assert_eq!(tokens[0].literal(), Some(serde_json::json!("hello")));
    }

    #[test]
    fn test_lexer_multiline_string_tracks_lines() {
        let tokens = scan("\"line one\nline two\" next").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String("line one\nline two".to_string()));
        assert_eq!(tokens[0].line(), 1);
        assert_eq!(tokens[1].kind, TokenKind::Identifier("next".to_string()));
        assert_eq!(tokens[1].line(), 2);
    }

    #[test]
    fn test_lexer_numbers() {
        let k = kinds("42 2.75 -7 -0.5");
        assert_eq!(k[0], TokenKind::Number(42.0));
        assert_eq!(k[1], TokenKind::Number(2.75));
        assert_eq!(k[2], TokenKind::Number(-7.0));
        assert_eq!(k[3], TokenKind::Number(-0.5));
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        let tokens = scan_lenient("1.").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(1.0));
        assert_eq!(tokens[0].lexeme, "1");
        assert!(scan("1.").is_err());
    }

    #[test]
    fn test_lexer_booleans() {
        let tokens = scan("true false").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Boolean(true));
        assert_eq!(tokens[1].literal(), Some(serde_json::json!(false)));
    }

    #[test]
    fn test_lexer_spans_slice_source() {
        let source = "@data { \"a\": 1 }";
        let tokens = scan(source).unwrap();
        let open = &tokens[2];
        let close = &tokens[6];
        assert_eq!(open.kind, TokenKind::LBrace);
        assert_eq!(close.kind, TokenKind::RBrace);
        assert_eq!(&source[open.span.end..close.span.start], " \"a\": 1 ");
    }

    #[test]
    fn test_strict_lexer_rejects_unknown_character() {
        let err = scan("@spell Ignite\n  $").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedCharacter {
                ch: '$',
                line: 2,
                column: 3
            }
        );
    }

    #[test]
    fn test_lenient_lexer_skips_unknown_character() {
        let tokens = scan_lenient("@spell $ Ignite").unwrap();
        let k: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::At,
                TokenKind::Spell,
                TokenKind::Identifier("Ignite".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_fatal_in_both_modes() {
        let strict = scan("@description \"never closed").unwrap_err();
        let lenient = scan_lenient("@description \"never closed").unwrap_err();
        assert_eq!(strict, LexError::UnterminatedString { line: 1, column: 14 });
        assert_eq!(strict, lenient);
    }

    #[test]
    fn test_lone_minus_is_unexpected() {
        assert!(matches!(
            scan("- x").unwrap_err(),
            LexError::UnexpectedCharacter { ch: '-', .. }
        ));
    }

    #[test]
    fn test_token_categories() {
        let tokens = scan("@ foo spell \"s\" 1 \n").unwrap();
        let cats: Vec<_> = tokens.iter().map(|t| t.kind.category()).collect();
        assert_eq!(
            cats,
            vec![
                TokenCategory::Structural,
                TokenCategory::Identifier,
                TokenCategory::Keyword,
                TokenCategory::StringLiteral,
                TokenCategory::NumberLiteral,
                TokenCategory::Newline,
                TokenCategory::EndOfInput,
            ]
        );
    }
}
