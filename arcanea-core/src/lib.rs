//! Arcanea Core - Shared Types
//!
//! Error taxonomy, configuration, identifiers, and the structured-value helpers
//! (dotted paths, string coercion, `${key}` substitution) used by the DSL
//! interpreter, the trigger engine, and the workflow orchestrator.

pub mod config;
pub mod error;
pub mod identity;
pub mod value;

pub use config::ArcaneaConfig;
pub use error::*;
pub use identity::*;
pub use value::*;
