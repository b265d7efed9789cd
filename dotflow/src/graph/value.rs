//! Typed attribute values
//!
//! DOT attribute values arrive as bare strings; this module decodes them
//! into the small value vocabulary the rest of the engine works with.
//! Decoding is applied in a fixed priority order: quoted text is
//! unquoted first, then booleans, duration literals, integers, and
//! decimals are recognized, and anything else stays a raw string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Time unit accepted as a duration suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Ms,
    S,
    M,
    H,
    D,
}

impl DurationUnit {
    /// Fixed multiplier from this unit to seconds
    pub fn seconds_multiplier(&self) -> f64 {
        match self {
            DurationUnit::Ms => 0.001,
            DurationUnit::S => 1.0,
            DurationUnit::M => 60.0,
            DurationUnit::H => 3600.0,
            DurationUnit::D => 86_400.0,
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ms" => Some(DurationUnit::Ms),
            "s" => Some(DurationUnit::S),
            "m" => Some(DurationUnit::M),
            "h" => Some(DurationUnit::H),
            "d" => Some(DurationUnit::D),
            _ => None,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            DurationUnit::Ms => "ms",
            DurationUnit::S => "s",
            DurationUnit::M => "m",
            DurationUnit::H => "h",
            DurationUnit::D => "d",
        }
    }
}

/// A duration literal such as `30s` or `5m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationValue {
    pub value: i64,
    pub unit: DurationUnit,
}

impl DurationValue {
    pub fn new(value: i64, unit: DurationUnit) -> Self {
        Self { value, unit }
    }

    /// Convert to seconds using the fixed unit multipliers
    pub fn to_seconds(&self) -> f64 {
        self.value as f64 * self.unit.seconds_multiplier()
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(DurationValue),
    Str(String),
}

impl AttrValue {
    /// Decode a raw attribute string into a typed value.
    ///
    /// Priority order: unquote, empty string, boolean, duration literal,
    /// integer, decimal, raw string.
    pub fn parse(raw: &str) -> AttrValue {
        let mut text = raw.trim();
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            text = &text[1..text.len() - 1];
        }
        if text.is_empty() {
            return AttrValue::Str(String::new());
        }
        let lower = text.to_ascii_lowercase();
        if lower == "true" || lower == "false" {
            return AttrValue::Bool(lower == "true");
        }
        if let Ok(duration_re) = Regex::new(r"^(-?\d+)(ms|s|m|h|d)$") {
            if let Some(caps) = duration_re.captures(text) {
                let value: i64 = caps[1].parse().unwrap_or(0);
                if let Some(unit) = DurationUnit::from_suffix(&caps[2]) {
                    return AttrValue::Duration(DurationValue::new(value, unit));
                }
            }
        }
        if let Ok(int_re) = Regex::new(r"^-?\d+$") {
            if int_re.is_match(text) {
                if let Ok(value) = text.parse::<i64>() {
                    return AttrValue::Int(value);
                }
            }
        }
        if let Ok(float_re) = Regex::new(r"^-?\d+\.\d+$") {
            if float_re.is_match(text) {
                if let Ok(value) = text.parse::<f64>() {
                    return AttrValue::Float(value);
                }
            }
        }
        AttrValue::Str(text.to_string())
    }

    /// Truthiness in the same spirit as the condition evaluator: empty
    /// strings, zero numbers, and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::Duration(d) => d.value != 0,
            AttrValue::Str(s) => !s.is_empty(),
        }
    }

    /// View as a boolean, if the value is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce to an integer where a numeric reading exists
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Float(f) => Some(*f as i64),
            AttrValue::Bool(b) => Some(i64::from(*b)),
            AttrValue::Str(s) => s.trim().parse().ok(),
            AttrValue::Duration(_) => None,
        }
    }

    /// View as a string slice, if the value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert into plain JSON for the condition evaluator and handlers.
    ///
    /// Durations flatten to their second count so guards can compare them
    /// numerically.
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Int(i) => Value::from(*i),
            AttrValue::Float(f) => Value::from(*f),
            AttrValue::Duration(d) => Value::from(d.to_seconds()),
            AttrValue::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Duration(d) => write!(f, "{}", d),
            AttrValue::Str(s) => write!(f, "{}", s),
        }
    }
}
