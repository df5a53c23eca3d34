//! Match strategies
//!
//! A [`MatchStrategy`] is the declarative, serializable form of a trigger's
//! rule. Registration compiles it into a [`Matcher`] so that regexes and
//! cron expressions are validated once.

use crate::condition::{CompiledCondition, CompiledExpr, ConditionExpr, FieldCondition};
use crate::cron::CronSchedule;
use arcanea_core::{DurationMs, Timestamp, TriggerError};
use chrono::{DateTime, TimeZone, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// When a scheduled trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Five-field cron expression, checked against the processing instant
    Cron(String),
    /// Minimum time since the context's `lastRun`
    Interval { interval_ms: DurationMs },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-insensitive substrings; confidence scales with the share matched.
    Keyword { keywords: Vec<String> },
    /// Case-insensitive regexes, first match wins.
    Pattern { patterns: Vec<String> },
    /// Share of the intent's words present in the text, against the threshold.
    Semantic { intent: String },
    /// Every condition holds.
    Conditional {
        #[serde(default)]
        conditions: Vec<FieldCondition>,
    },
    /// Nested AND / OR / NOT.
    Composite { expr: ConditionExpr },
    Scheduled { schedule: Schedule },
}

impl MatchStrategy {
    pub fn keywords(keywords: &[&str]) -> Self {
        MatchStrategy::Keyword {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        MatchStrategy::Pattern {
            patterns: vec![pattern.into()],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MatchStrategy::Keyword { .. } => "keyword",
            MatchStrategy::Pattern { .. } => "pattern",
            MatchStrategy::Semantic { .. } => "semantic",
            MatchStrategy::Conditional { .. } => "conditional",
            MatchStrategy::Composite { .. } => "composite",
            MatchStrategy::Scheduled { .. } => "scheduled",
        }
    }
}

/// Details of a successful match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub confidence: f64,
    /// Matched keywords, or the full text of the regex match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<String>,
    /// Named capture groups of a pattern match
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, String>,
}

impl MatchOutcome {
    fn certain() -> Self {
        Self {
            confidence: 1.0,
            ..Default::default()
        }
    }
}

/// A strategy with its regexes and cron expression compiled.
#[derive(Debug, Clone)]
pub(crate) enum Matcher {
    Keyword(Vec<String>),
    Pattern(Vec<Regex>),
    Semantic(Vec<String>),
    Conditional(Vec<CompiledCondition>),
    Composite(CompiledExpr),
    Cron(CronSchedule),
    Interval(DurationMs),
}

impl Matcher {
    pub fn compile(strategy: &MatchStrategy) -> Result<Self, TriggerError> {
        Ok(match strategy {
            MatchStrategy::Keyword { keywords } => {
                Matcher::Keyword(keywords.iter().map(|k| k.to_lowercase()).collect())
            }
            MatchStrategy::Pattern { patterns } => Matcher::Pattern(
                patterns
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| TriggerError::InvalidPattern {
                                pattern: p.clone(),
                                reason: e.to_string(),
                            })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            MatchStrategy::Semantic { intent } => Matcher::Semantic(
                intent
                    .to_lowercase()
                    .split(' ')
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            MatchStrategy::Conditional { conditions } => Matcher::Conditional(
                conditions
                    .iter()
                    .map(CompiledCondition::compile)
                    .collect::<Result<_, _>>()?,
            ),
            MatchStrategy::Composite { expr } => Matcher::Composite(CompiledExpr::compile(expr)?),
            MatchStrategy::Scheduled { schedule } => match schedule {
                Schedule::Cron(expr) => Matcher::Cron(CronSchedule::parse(expr)?),
                Schedule::Interval { interval_ms } => Matcher::Interval(*interval_ms),
            },
        })
    }

    /// Evaluate against `context` at instant `at`. `base` is the trigger's
    /// confidence; the semantic strategy uses it as its threshold.
    pub fn evaluate(&self, context: &Value, base: f64, at: Timestamp) -> Option<MatchOutcome> {
        match self {
            Matcher::Keyword(keywords) => {
                let text = context_text(context).to_lowercase();
                let matches: Vec<String> = keywords
                    .iter()
                    .filter(|k| text.contains(k.as_str()))
                    .cloned()
                    .collect();
                if matches.is_empty() {
                    return None;
                }
                let confidence = base * (matches.len() as f64 / keywords.len() as f64);
                Some(MatchOutcome {
                    confidence: confidence.min(1.0),
                    matches,
                    groups: BTreeMap::new(),
                })
            }
            Matcher::Pattern(regexes) => {
                let text = context_text(context);
                regexes.iter().find_map(|re| {
                    let caps = re.captures(text)?;
                    let groups = re
                        .capture_names()
                        .flatten()
                        .filter_map(|name| {
                            caps.name(name)
                                .map(|m| (name.to_string(), m.as_str().to_string()))
                        })
                        .collect();
                    Some(MatchOutcome {
                        confidence: base.min(1.0),
                        matches: vec![caps[0].to_string()],
                        groups,
                    })
                })
            }
            Matcher::Semantic(words) => {
                if words.is_empty() {
                    return None;
                }
                let text = context_text(context).to_lowercase();
                let score = words.iter().filter(|w| text.contains(w.as_str())).count();
                let confidence = score as f64 / words.len() as f64;
                (confidence >= base).then(|| MatchOutcome {
                    confidence,
                    ..Default::default()
                })
            }
            Matcher::Conditional(conditions) => conditions
                .iter()
                .all(|c| c.evaluate(context))
                .then(MatchOutcome::certain),
            Matcher::Composite(expr) => expr.evaluate(context).then(MatchOutcome::certain),
            Matcher::Cron(schedule) => schedule.matches(at).then(MatchOutcome::certain),
            Matcher::Interval(interval_ms) => {
                let last_run = last_run(context);
                let elapsed = (at - last_run).num_milliseconds();
                (elapsed >= *interval_ms as i64).then(MatchOutcome::certain)
            }
        }
    }
}

/// The text a trigger inspects: `text`, else `content`, else empty.
pub fn context_text(context: &Value) -> &str {
    context
        .get("text")
        .and_then(Value::as_str)
        .or_else(|| context.get("content").and_then(Value::as_str))
        .unwrap_or("")
}

/// `lastRun` as an RFC 3339 string or epoch milliseconds; the epoch when
/// absent or unreadable.
fn last_run(context: &Value) -> DateTime<Utc> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    match context.get("lastRun") {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(epoch),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(epoch),
        _ => epoch,
    }
}
