//! Arcanea DSL - `.arc` Language Front End
//!
//! Lexer, recursive-descent parser, and pretty-printer for the declarative
//! `.arc` format describing spells, characters, worlds, and archetypes.
//!
//! Architecture:
//! ```text
//! .arc source
//!     ↓
//! Lexer (strict or lenient)  → Vec<Token>
//!     ↓
//! Parser (panic-mode recovery) → ArcProgram { declarations, errors }
//!     ↓
//! Pretty printer (for round-trip and re-export)
//! ```
//!
//! `{...}` / `[...]` clause values are JSON; a block that does not decode is
//! kept as `{"raw": <text>}` rather than failing the declaration.

pub mod lexer;
pub mod parser;
pub mod pretty_printer;

// Re-export key types for convenience
pub use lexer::*;
pub use parser::*;
pub use pretty_printer::{pretty_print, pretty_print_declaration};
