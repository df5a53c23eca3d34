//! Error types for Arcanea operations

use thiserror::Error;
use uuid::Uuid;

/// Fatal scanner errors. Scanning stops at the first one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("Unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. } | LexError::UnterminatedString { line, .. } => {
                *line
            }
        }
    }
}

/// Errors raised by the external generation capability surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("No generation provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} reported failure: {message}")]
    Rejected { provider: String, message: String },

    #[error("Custom handler {handler} failed: {reason}")]
    HandlerFailed { handler: String, reason: String },
}

/// DSL interpreter and environment errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Unknown spell: {name}")]
    UnknownSpell { name: String },

    #[error("Unknown guardian: {guardian}")]
    UnknownGuardian { guardian: String },

    #[error("{name} is not callable")]
    NotCallable { name: String },

    #[error("Invalid argument for {builtin}: {reason}")]
    InvalidArgument { builtin: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),
}

/// Trigger engine errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid schedule '{spec}': {reason}")]
    InvalidSchedule { spec: String, reason: String },

    #[error("Trigger not found: {id}")]
    NotFound { id: String },

    #[error("Action {action} failed: {reason}")]
    ActionFailed { action: String, reason: String },
}

/// Workflow orchestration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Workflow not found: {id}")]
    NotFound { id: String },

    #[error("Workflow instance not found: {instance_id}")]
    InstanceNotFound { instance_id: Uuid },

    #[error("Phase {phase} failed: {reason}")]
    PhaseFailed { phase: String, reason: String },

    #[error("Phase {phase} timed out after {timeout_ms}ms")]
    PhaseTimedOut { phase: String, timeout_ms: u64 },

    #[error("Workflow instance {instance_id} was cancelled")]
    Cancelled { instance_id: Uuid },

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Arcanea errors.
#[derive(Debug, Clone, Error)]
pub enum ArcaneaError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Interpreter error: {0}")]
    Interpreter(#[from] InterpreterError),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Arcanea operations.
pub type ArcaneaResult<T> = Result<T, ArcaneaError>;

// =============================================================================
// TESTS
// =============================================================================
