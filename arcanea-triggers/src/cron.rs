//! Five-field cron expressions
//!
//! `minute hour day-of-month month day-of-week`, evaluated in UTC. Each field
//! accepts `*`, a number, a range `a-b`, a comma list, or a step `x/n`.
//! `*/n` and `a-b/n` step from the start of the range, so `*/15` in the
//! minute field selects 0, 15, 30 and 45. `a/n` selects the multiples of `n`
//! that are at least `a`: `5/15` is 15, 30 and 45.

use arcanea_core::{Timestamp, TriggerError};
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Allowed values of one cron field, as a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(&self, value: u32) -> bool {
        value < 64 && self.0 & (1 << value) != 0
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23 };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
// 7 is accepted as Sunday and folded onto 0
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 7 };

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronSchedule {
    source: String,
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, TriggerError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(expr, format!("expected 5 fields, found {}", fields.len())));
        }
        let mut days_of_week = parse_field(expr, fields[4], DAY_OF_WEEK)?;
        if days_of_week.contains(7) {
            days_of_week = FieldSet((days_of_week.0 & !(1 << 7)) | 1);
        }
        Ok(Self {
            source: expr.trim().to_string(),
            minutes: parse_field(expr, fields[0], MINUTE)?,
            hours: parse_field(expr, fields[1], HOUR)?,
            days_of_month: parse_field(expr, fields[2], DAY_OF_MONTH)?,
            months: parse_field(expr, fields[3], MONTH)?,
            days_of_week,
        })
    }

    /// Whether the minute containing `at` is selected. All five fields must
    /// match.
    pub fn matches(&self, at: Timestamp) -> bool {
        self.minutes.contains(at.minute())
            && self.hours.contains(at.hour())
            && self.days_of_month.contains(at.day())
            && self.months.contains(at.month())
            && self.days_of_week.contains(at.weekday().num_days_from_sunday())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for CronSchedule {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CronSchedule {
    type Error = TriggerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CronSchedule> for String {
    fn from(schedule: CronSchedule) -> Self {
        schedule.source
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn invalid(expr: &str, reason: String) -> TriggerError {
    TriggerError::InvalidSchedule {
        spec: expr.to_string(),
        reason,
    }
}

fn parse_field(expr: &str, field: &str, spec: FieldSpec) -> Result<FieldSet, TriggerError> {
    let mut bits = 0u64;
    for part in field.split(',') {
        let (range, step) = match part.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| invalid(expr, format!("bad step '{}' in {}", step, spec.name)))?;
                if step == 0 {
                    return Err(invalid(expr, format!("zero step in {}", spec.name)));
                }
                (range, step)
            }
            None => (part, 1),
        };

        if part.contains('/') && range != "*" && !range.contains('-') {
            let start = number(expr, range, spec)?;
            for value in start..=spec.max {
                if value % step == 0 {
                    bits |= 1 << value;
                }
            }
            continue;
        }

        let (start, end) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            (number(expr, a, spec)?, number(expr, b, spec)?)
        } else {
            let value = number(expr, range, spec)?;
            (value, value)
        };
        if start > end {
            return Err(invalid(expr, format!("empty range {} in {}", range, spec.name)));
        }

        let mut value = start;
        while value <= end {
            bits |= 1 << value;
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }
    }
    Ok(FieldSet(bits))
}

fn number(expr: &str, text: &str, spec: FieldSpec) -> Result<u32, TriggerError> {
    let value: u32 = text
        .parse()
        .map_err(|_| invalid(expr, format!("'{}' is not a number in {}", text, spec.name)))?;
    if value < spec.min || value > spec.max {
        return Err(invalid(
            expr,
            format!("{} out of range {}-{} in {}", value, spec.min, spec.max, spec.name),
        ));
    }
    Ok(value)
}
