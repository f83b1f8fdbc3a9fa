//! Typed scalar cell values.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::types::ColumnType;

/// Canonical text form of a timestamp, used in the store and in exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Markers treated as missing when reading text cells.
const NULL_MARKERS: &[&str] = &["", "na", "n/a", "null", "nan", "none", "#n/a", "<na>"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A single typed cell.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Build a value from a raw text cell without type inference.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Check if a raw text cell represents a missing value.
    pub fn is_null_marker(raw: &str) -> bool {
        let trimmed = raw.trim();
        NULL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
    }

    /// Parse a raw text cell as an integer, float or text value.
    pub fn infer(raw: &str) -> Self {
        if Self::is_null_marker(raw) {
            return Value::Null;
        }
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The natural column type of this value (`None` for null).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Canonical key used to match rows across tables.
    ///
    /// Numbers compare by value regardless of integer/float storage, and
    /// null never matches anything.
    pub fn join_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(format!("n:{}", *i as f64)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) => Some(format!("n:{}", f)),
            Value::Text(s) => Some(format!("s:{}", s)),
            Value::Timestamp(ts) => Some(format!("t:{}", ts.format(TIMESTAMP_FORMAT))),
        }
    }

    /// Convert to the given column type, widening or stringifying as needed.
    pub fn cast(self, target: ColumnType) -> Value {
        match (self, target) {
            (Value::Null, _) => Value::Null,
            (Value::Integer(i), ColumnType::Float) => Value::Float(i as f64),
            (Value::Float(f), ColumnType::Integer) if f.fract() == 0.0 => Value::Integer(f as i64),
            (Value::Text(s), ColumnType::Timestamp) => {
                parse_timestamp(&s).map_or(Value::Null, Value::Timestamp)
            }
            (Value::Text(s), ColumnType::Integer | ColumnType::Float) => {
                match Value::infer(&s) {
                    v @ (Value::Integer(_) | Value::Float(_)) => v.cast(target),
                    _ => Value::Text(s),
                }
            }
            (v, ColumnType::Text) if !matches!(v, Value::Text(_)) => Value::Text(v.to_string()),
            (v, _) => v,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
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
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => canonical_bits(*f).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Timestamp(ts) => ts.hash(state),
        }
    }
}

/// Bit pattern with `-0.0` folded into `0.0` and all NaNs folded together.
fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// Parse a timestamp from the date/time layouts seen in retail exports.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc())
}
