//! Fuzz target for the `.arc` parser
//!
//! Parsing recovers from every error, so any lexable input yields a program.
//! Recovered errors carry a 1-based location, and a clean program
//! re-parses to the same declarations after pretty-printing.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use arcanea_dsl::{parse, parse_with_mode, pretty_print, LexMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse(input);

    let Ok(program) = parse_with_mode(input, LexMode::Lenient) else {
        return;
    };
    for error in &program.errors {
        assert!(error.line >= 1);
        assert!(error.column >= 1);
        assert!(!error.message.is_empty());
    }

    if program.is_clean() {
        let printed = pretty_print(&program.declarations);
        if let Ok(reparsed) = parse(&printed) {
            assert_eq!(reparsed.declarations.len(), program.declarations.len());
        }
    }
});
