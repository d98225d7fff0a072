//! Compares a resolved setting against what a rule expects.
//!
//! Comparisons are deliberately small and explicit:
//!
//! * Numbers compare numerically. A string that parses as a number compares numerically with a
//!   number, so the flag value `"0"` equals the config value `0`.
//! * Booleans and boolean literals compare as booleans, ignoring ASCII case. The YAML 1.1
//!   spellings `yes`/`no`, `on`/`off` and `y`/`n` count too, since a YAML 1.2 decoder leaves
//!   them as strings.
//! * Other strings compare exactly, `null` only equals `null`, and anything else compares
//!   structurally.
//! * An explicit `null` counts as absent.

use crate::document::ResolvedValue;
use crate::results::CheckerResult;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(Value),
    /// Also satisfied when the setting is absent.
    NotEquals(Value),
    GreaterOrEqual(f64),
    IsAbsent,
    OneOf(Vec<Value>),
    FlagPresent,
    FlagAbsent,
    /// The setting is absent, which means an accepted default applies, or it satisfies the
    /// inner predicate.
    AbsentOr(Box<Predicate>),
}

impl Predicate {
    pub fn absent_or(predicate: Predicate) -> Self {
        Predicate::AbsentOr(Box::new(predicate))
    }

    /// Whether `value` satisfies the predicate. Values from sources that could not be read
    /// satisfy nothing.
    pub fn accepts(&self, value: &ResolvedValue) -> bool {
        let present = match value {
            ResolvedValue::SourceUnavailable(_) | ResolvedValue::MalformedSource(_) => {
                return false
            }
            _ if value.is_absent_or_null() => None,
            ResolvedValue::Present(present) => Some(present),
            ResolvedValue::Absent => None,
        };

        match (self, present) {
            (Predicate::IsAbsent | Predicate::FlagAbsent, present) => present.is_none(),
            (Predicate::FlagPresent, present) => present.is_some(),
            (Predicate::AbsentOr(_), None) => true,
            (Predicate::AbsentOr(inner), Some(_)) => inner.accepts(value),
            (Predicate::NotEquals(_), None) => true,
            (Predicate::NotEquals(expected), Some(actual)) => !loosely_equal(actual, expected),
            (_, None) => false,
            (Predicate::Equals(expected), Some(actual)) => loosely_equal(actual, expected),
            (Predicate::GreaterOrEqual(threshold), Some(actual)) => {
                as_number(actual).map_or(false, |n| n >= *threshold)
            }
            (Predicate::OneOf(allowed), Some(actual)) => {
                allowed.iter().any(|expected| loosely_equal(actual, expected))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(expected) => write!(f, "equal to {}", expected),
            Predicate::NotEquals(expected) => write!(f, "not equal to {}", expected),
            Predicate::GreaterOrEqual(threshold) => write!(f, "at least {}", threshold),
            Predicate::IsAbsent => write!(f, "absent"),
            Predicate::OneOf(allowed) => {
                let allowed: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                write!(f, "one of [{}]", allowed.join(", "))
            }
            Predicate::FlagPresent => write!(f, "present"),
            Predicate::FlagAbsent => write!(f, "not present"),
            Predicate::AbsentOr(inner) => write!(f, "absent or {}", inner),
        }
    }
}

/// Evaluates `value` against `predicate`. Unreadable sources give `ERROR`, never a verdict.
pub fn evaluate(value: &ResolvedValue, predicate: &Predicate) -> CheckerResult {
    match value {
        ResolvedValue::SourceUnavailable(reason) => {
            CheckerResult::error(format!("source unavailable: {}", reason))
        }
        ResolvedValue::MalformedSource(reason) => {
            CheckerResult::error(format!("malformed source: {}", reason))
        }
        _ if predicate.accepts(value) => {
            CheckerResult::pass(format!("found {}, expected {}", value, predicate))
        }
        _ => CheckerResult::fail(format!("found {}, expected {}", value, predicate)),
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            match (as_number(actual), as_number(expected)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            as_bool(s) == Some(*b)
        }
        (Value::String(a), Value::String(b)) => match (as_bool(a), as_bool(b)) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

/// Boolean literals as YAML 1.1 reads them, which is how the kubelet loads its config.
fn as_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "on" => Some(true),
        "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
