//! Arcanea Triggers - Pattern-Matching Engine
//!
//! Triggers pair a match strategy with a list of actions. The engine runs
//! every processed context past each enabled trigger in registration order;
//! a match routes to a guardian and executes the trigger's actions.
//!
//! - Strategies: keyword, pattern, semantic, conditional, composite, scheduled
//! - Actions: generate, analyze, enhance, transform, validate, suggest,
//!   workflow, custom
//! - A failed critical action skips the rest of that trigger's actions

mod action;
mod builtin;
mod condition;
mod cron;
mod engine;
mod router;
mod strategy;
mod trigger;

pub use action::{ActionHandler, ActionInvocation, ActionKind, ActionResult, TriggerAction};
pub use builtin::builtin_triggers;
pub use condition::{ConditionExpr, ConditionOperator, FieldCondition};
pub use cron::CronSchedule;
pub use engine::TriggerEngine;
pub use router::{skill_suggestions, GuardianRouter, Suggestion, FALLBACK_GUARDIAN};
pub use strategy::{context_text, MatchOutcome, MatchStrategy, Schedule};
pub use trigger::{HistoryEntry, MatchResult, Trigger, TriggerStats, TriggerSummary};
