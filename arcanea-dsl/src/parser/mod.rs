//! Parser module for the Arcanea DSL

pub mod ast;
pub mod literal;
pub mod parser;

pub use ast::*;
pub use literal::*;
pub use parser::*;
