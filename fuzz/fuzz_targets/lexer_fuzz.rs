//! Fuzz target for the `.arc` lexer
//!
//! Arbitrary UTF-8 must never panic in either lex mode. Lenient mode only
//! fails on an unterminated string.
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use arcanea_core::LexError;
use arcanea_dsl::{Lexer, TokenKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(tokens) = Lexer::new(input).tokenize() {
        check_tokens(input, &tokens);
    }

    match Lexer::lenient(input).tokenize() {
        Ok(tokens) => check_tokens(input, &tokens),
        Err(e) => assert!(
            matches!(e, LexError::UnterminatedString { .. }),
            "lenient lexing failed: {}",
            e
        ),
    }
});

fn check_tokens(input: &str, tokens: &[arcanea_dsl::Token]) {
    assert_eq!(
        tokens.last().map(|t| &t.kind),
        Some(&TokenKind::Eof),
        "last token is Eof"
    );
    for token in tokens {
        assert!(token.span.start <= token.span.end);
        assert!(token.span.end <= input.len());
        assert!(token.span.line >= 1);
        assert!(token.span.column >= 1);
    }
}
