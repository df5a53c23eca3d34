//! Runtime facade
//!
//! Loads `.arc` sources from strings, files, and directory trees, and
//! forwards entity operations to the [`Interpreter`].

use crate::interpreter::Interpreter;
use crate::registry::{CharacterRecord, ExecutionSummary, WorldRecord};
use arcanea_core::{InterpreterError, Timestamp, ValueMap};
use arcanea_dsl::{parse_with_mode, ArcProgram, CharacterDecl, LexMode, WorldDecl};
use arcanea_events::RuntimeEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// A source file that was loaded, with what it produced.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub program: ArcProgram,
    pub summary: ExecutionSummary,
    pub loaded_at: Timestamp,
}

/// Counters describing a runtime session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub spells: usize,
    pub characters: usize,
    pub worlds: usize,
    pub guardians: usize,
    pub modules_loaded: usize,
    pub execution_history: usize,
}

pub struct Runtime {
    interpreter: Interpreter,
    lex_mode: LexMode,
    modules: HashMap<PathBuf, LoadedModule>,
}

impl Runtime {
    /// Sources are scanned leniently: stray characters are skipped.
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            lex_mode: LexMode::Lenient,
            modules: HashMap::new(),
        }
    }

    pub fn with_lex_mode(mut self, mode: LexMode) -> Self {
        self.lex_mode = mode;
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Parse and interpret `source`. Parse errors are logged and reported in
    /// the `SourceLoaded` event; only a lex error fails the load.
    pub async fn load_source(&mut self, source: &str) -> Result<ExecutionSummary, InterpreterError> {
        let (_, summary) = self.load_named(source, None).await?;
        Ok(summary)
    }

    pub async fn load_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ExecutionSummary, InterpreterError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading .arc file");
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InterpreterError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let (program, summary) = self.load_named(&source, Some(path)).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load file");
            e
        })?;
        info!(
            path = %path.display(),
            spells = summary.spells_registered,
            characters = summary.characters_created,
            worlds = summary.worlds_built,
            "Loaded .arc file"
        );
        self.modules.insert(
            path.to_path_buf(),
            LoadedModule {
                program,
                summary: summary.clone(),
                loaded_at: arcanea_core::now(),
            },
        );
        Ok(summary)
    }

    /// Load every `.arc` file under `dir`, recursing into subdirectories in
    /// name order. Files that fail to load are skipped with a warning.
    /// Returns the number of files loaded.
    pub async fn load_directory(&mut self, dir: impl AsRef<Path>) -> Result<usize, InterpreterError> {
        let mut pending = vec![dir.as_ref().to_path_buf()];
        let mut loaded = 0;

        while let Some(current) = pending.pop() {
            let mut subdirs = Vec::new();
            for (path, is_dir) in read_dir_sorted(&current).await? {
                if is_dir {
                    subdirs.push(path);
                } else if path.extension().is_some_and(|ext| ext == "arc") {
                    match self.load_file(&path).await {
                        Ok(_) => loaded += 1,
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Skipped invalid file")
                        }
                    }
                }
            }
            // Reversed so subdirectories pop in name order.
            pending.extend(subdirs.into_iter().rev());
        }

        info!(dir = %dir.as_ref().display(), loaded, "Loaded .arc directory");
        Ok(loaded)
    }

    async fn load_named(
        &mut self,
        source: &str,
        path: Option<&Path>,
    ) -> Result<(ArcProgram, ExecutionSummary), InterpreterError> {
        let program = parse_with_mode(source, self.lex_mode)?;
        let origin = path.map(|p| p.display().to_string());
        for err in &program.errors {
            warn!(
                origin = origin.as_deref().unwrap_or("<source>"),
                line = err.line,
                message = %err.message,
                "Parse error"
            );
        }
        let summary = self.interpreter.interpret(&program).await;
        self.interpreter.events().emit(RuntimeEvent::SourceLoaded {
            path: origin,
            declarations: program.declarations.len(),
            parse_errors: program.errors.len(),
        });
        Ok((program, summary))
    }

    pub fn module(&self, path: impl AsRef<Path>) -> Option<&LoadedModule> {
        self.modules.get(path.as_ref())
    }

    // ========================================================================
    // ENTITY OPERATIONS
    // ========================================================================

    /// Register a character built in code. An empty archetype becomes `unknown`.
    pub async fn create_character(&mut self, mut character: CharacterDecl) -> CharacterRecord {
        if character.archetype.is_empty() {
            character.archetype = "unknown".to_string();
        }
        character.line = 0;
        self.interpreter.register_character(character).await
    }

    pub async fn build_world(&mut self, mut world: WorldDecl) -> WorldRecord {
        world.line = 0;
        self.interpreter.register_world(world).await
    }

    pub async fn cast_spell(&mut self, name: &str, args: ValueMap) -> Result<Value, InterpreterError> {
        self.interpreter.cast_spell(name, args).await
    }

    pub async fn summon_guardian(&mut self, guardian: &str, task: &str) -> Result<Value, InterpreterError> {
        self.interpreter.summon(guardian, task).await
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            spells: self.interpreter.list_spells().len(),
            characters: self.interpreter.list_characters().len(),
            worlds: self.interpreter.list_worlds().len(),
            guardians: self.interpreter.list_guardians().len(),
            modules_loaded: self.modules.len(),
            execution_history: self.interpreter.execution_history().len(),
        }
    }
}

/// Directory entries sorted by file name, with a directory flag.
async fn read_dir_sorted(dir: &Path) -> Result<Vec<(PathBuf, bool)>, InterpreterError> {
    let io_err = |e: std::io::Error| InterpreterError::Io {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };
    let mut reader = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(io_err)? {
        let file_type = entry.file_type().await.map_err(io_err)?;
        entries.push((entry.path(), file_type.is_dir()));
    }
    entries.sort();
    Ok(entries)
}
