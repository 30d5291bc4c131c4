//! FILENAME: grid-engine/src/value.rs
//! PURPOSE: The loosely typed cell value carried by every row.
//! CONTEXT: Business records arrive without a fixed schema, so a cell may hold
//! nothing, a flag, a number, free text, a date, or a nested sub-object. The
//! pipeline never trusts the declared shape: every stage goes through the
//! coercion helpers defined here.

use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::dates::{format_date, parse_value_date};
use crate::number::{format_number, parse_number};
use crate::row::Row;

/// A single cell value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    /// A sub-object, reachable through the nested-field accessor.
    Nested(Row),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for null and for text that is blank after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Strict numeric reading: numbers, and text that parses as a finite number
    /// once thousands separators are removed. Flags and dates are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Numeric reading with non-numeric content coerced to zero.
    pub fn coerce_f64(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    /// Flag reading used by tri-state filters: `true|1|"1"` and `false|0|"0"`.
    /// Textual literals are not flags here, so an `equals` filter on a column
    /// typed Boolean only from `yes/no/y/n` text matches no row.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) if *n == 1.0 => Some(true),
            Value::Number(n) if *n == 0.0 => Some(false),
            Value::Text(s) => match s.trim() {
                "1" => Some(true),
                "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Flag reading that also accepts the textual literals
    /// (`true/false/yes/no/y/n`, case-insensitive). Used for ordering.
    pub fn as_bool_loose(&self) -> Option<bool> {
        if let Some(flag) = self.as_flag() {
            return Some(flag);
        }
        match self {
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" => Some(true),
                "false" | "no" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Date reading: dates, parseable date text, and numbers as epoch millis.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        parse_value_date(self)
    }

    /// The string form used for equality-by-coercion, group keys and
    /// substring matching.
    pub fn to_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Date(d) => format_date(d),
            Value::Nested(row) => {
                let parts: Vec<String> = row
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        }
    }

    /// Canonical float bits: all NaNs collapse to one pattern and `-0.0`
    /// to `0.0`, so that `Eq` and `Hash` agree.
    fn number_bits(n: f64) -> u64 {
        if n.is_nan() {
            f64::NAN.to_bits()
        } else if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                Value::number_bits(*a) == Value::number_bits(*b)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Nested(a), Value::Nested(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => Value::number_bits(*n).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Nested(row) => row.hash(state),
        }
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        Value::Nested(row)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s),
            // Arrays have no cell meaning; keep their text so they stay visible.
            serde_json::Value::Array(items) => {
                Value::Text(serde_json::Value::Array(items).to_string())
            }
            serde_json::Value::Object(map) => Value::Nested(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&format_date(d)),
            Value::Nested(row) => row.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer).map_err(de::Error::custom)?;
        Ok(Value::from(json))
    }
}
