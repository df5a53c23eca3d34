//! Arcanea Interpreter - Registries and Spell Execution
//!
//! Holds the state of one runtime session: a scoped environment, registries
//! of spells, characters, worlds, and guardians, and the spell execution
//! history. All state is owned by an [`Interpreter`] value; independent
//! sessions can coexist in one process.
//!
//! ```text
//! ArcProgram ──interpret──▶ registries (+ enrichment calls)
//!                     cast_spell ──▶ GenerationProvider ──▶ ExecutionRecord
//! ```

mod environment;
mod guardians;
mod interpreter;
mod registry;
mod runtime;

pub use environment::{Binding, Builtin, Environment, ScopeId};
pub use guardians::{default_guardians, select_guardian, select_provider, Guardian};
pub use interpreter::{Interpreter, SpellHandle};
pub use registry::{
    CharacterEnrichment, CharacterRecord, ExecutionRecord, ExecutionSummary, NamedRegistry,
    SpellRegistry, WorldEnrichment, WorldRecord,
};
pub use runtime::{LoadedModule, Runtime, RuntimeStats};
