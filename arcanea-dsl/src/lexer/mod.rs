//! Lexer module for the Arcanea DSL

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
