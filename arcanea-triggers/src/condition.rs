//! Field conditions over a trigger context

use arcanea_core::{coerce_to_f64, coerce_to_string, lookup_path, TriggerError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison applied to the value found at a condition's field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    /// String forms, substring test
    Contains,
    /// Numeric forms; false when either side is not a number
    GreaterThan,
    LessThan,
    /// Field present and not null
    Exists,
    /// Case-sensitive regex against the field's string form
    Regex,
}

/// One comparison against a dotted path into the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

impl FieldCondition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::new(field, ConditionOperator::Exists, Value::Null)
    }

    /// Reject regex conditions whose pattern does not compile.
    pub fn validate(&self) -> Result<(), TriggerError> {
        self.compile_regex().map(|_| ())
    }

    fn compile_regex(&self) -> Result<Option<Regex>, TriggerError> {
        if self.operator != ConditionOperator::Regex {
            return Ok(None);
        }
        let pattern = coerce_to_string(&self.value);
        Regex::new(&pattern)
            .map(Some)
            .map_err(|e| TriggerError::InvalidPattern {
                pattern,
                reason: e.to_string(),
            })
    }

    pub fn evaluate(&self, context: &Value) -> bool {
        match self.compile_regex() {
            Ok(regex) => self.evaluate_with(context, regex.as_ref()),
            Err(_) => false,
        }
    }

    fn evaluate_with(&self, context: &Value, regex: Option<&Regex>) -> bool {
        let found = lookup_path(context, &self.field).filter(|v| !v.is_null());
        let actual = found.unwrap_or(&Value::Null);
        match self.operator {
            ConditionOperator::Equals => same_value(actual, &self.value),
            ConditionOperator::NotEquals => !same_value(actual, &self.value),
            ConditionOperator::Contains => {
                coerce_to_string(actual).contains(&coerce_to_string(&self.value))
            }
            ConditionOperator::GreaterThan => compare(actual, &self.value, |a, b| a > b),
            ConditionOperator::LessThan => compare(actual, &self.value, |a, b| a < b),
            ConditionOperator::Exists => found.is_some(),
            ConditionOperator::Regex => {
                regex.is_some_and(|re| re.is_match(&coerce_to_string(actual)))
            }
        }
    }
}

/// Strict equality, except that numbers compare by value: `5.0` equals `5`.
fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), Value::Number(_)) => coerce_to_f64(actual) == coerce_to_f64(expected),
        _ => actual == expected,
    }
}

fn compare(actual: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (coerce_to_f64(actual), coerce_to_f64(expected)) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

/// Boolean combination of field conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionExpr {
    Field(FieldCondition),
    /// Every child holds; empty holds
    All(Vec<ConditionExpr>),
    /// Some child holds; empty holds
    Any(Vec<ConditionExpr>),
    Not(Box<ConditionExpr>),
}

impl ConditionExpr {
    pub fn validate(&self) -> Result<(), TriggerError> {
        match self {
            ConditionExpr::Field(condition) => condition.validate(),
            ConditionExpr::All(children) | ConditionExpr::Any(children) => {
                children.iter().try_for_each(ConditionExpr::validate)
            }
            ConditionExpr::Not(inner) => inner.validate(),
        }
    }

    pub fn evaluate(&self, context: &Value) -> bool {
        match self {
            ConditionExpr::Field(condition) => condition.evaluate(context),
            ConditionExpr::All(children) => children.iter().all(|c| c.evaluate(context)),
            ConditionExpr::Any(children) => {
                children.is_empty() || children.iter().any(|c| c.evaluate(context))
            }
            ConditionExpr::Not(inner) => !inner.evaluate(context),
        }
    }
}

/// A field condition with its regex compiled once at registration.
#[derive(Debug, Clone)]
pub(crate) struct CompiledCondition {
    condition: FieldCondition,
    regex: Option<Regex>,
}

impl CompiledCondition {
    pub fn compile(condition: &FieldCondition) -> Result<Self, TriggerError> {
        Ok(Self {
            regex: condition.compile_regex()?,
            condition: condition.clone(),
        })
    }

    pub fn evaluate(&self, context: &Value) -> bool {
        self.condition.evaluate_with(context, self.regex.as_ref())
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CompiledExpr {
    Field(CompiledCondition),
    All(Vec<CompiledExpr>),
    Any(Vec<CompiledExpr>),
    Not(Box<CompiledExpr>),
}

impl CompiledExpr {
    pub fn compile(expr: &ConditionExpr) -> Result<Self, TriggerError> {
        Ok(match expr {
            ConditionExpr::Field(condition) => {
                CompiledExpr::Field(CompiledCondition::compile(condition)?)
            }
            ConditionExpr::All(children) => CompiledExpr::All(
                children.iter().map(CompiledExpr::compile).collect::<Result<_, _>>()?,
            ),
            ConditionExpr::Any(children) => CompiledExpr::Any(
                children.iter().map(CompiledExpr::compile).collect::<Result<_, _>>()?,
            ),
            ConditionExpr::Not(inner) => CompiledExpr::Not(Box::new(CompiledExpr::compile(inner)?)),
        })
    }

    pub fn evaluate(&self, context: &Value) -> bool {
        match self {
            CompiledExpr::Field(condition) => condition.evaluate(context),
            CompiledExpr::All(children) => children.iter().all(|c| c.evaluate(context)),
            CompiledExpr::Any(children) => {
                children.is_empty() || children.iter().any(|c| c.evaluate(context))
            }
            CompiledExpr::Not(inner) => !inner.evaluate(context),
        }
    }
}
