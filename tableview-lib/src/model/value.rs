//! Value enum for dynamic field values

use std::cmp::Ordering;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use uuid::Uuid;

use super::Record;

/// A dynamic value that can hold any field of a table record.
///
/// Records store their fields as `Value`s, and columns read, compare and
/// match them without knowing the concrete type up front.
///
/// # Type Mapping
///
/// | JSON input | Rust Variant |
/// |------------|--------------|
/// | null | `Null` |
/// | true/false | `Bool` |
/// | integer fitting i32 | `Int` |
/// | larger integer | `Long` |
/// | fractional number | `Float` |
/// | UUID string | `Guid` |
/// | RFC 3339 string | `DateTime` |
/// | other string | `String` |
/// | object | `Record` |
/// | array of objects | `Records` (tree children) |
/// | anything else | `Json` |
///
/// # Example
///
/// ```
/// use tableview_lib::model::Value;
///
/// let name = Value::from("Contoso");
/// let age = Value::from(30);
/// let empty = Value::Null;
/// assert!(empty.is_null());
/// assert_eq!(age.key_string(), "30");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/empty value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Arbitrary precision decimal.
    Decimal(Decimal),
    /// String value.
    String(String),
    /// GUID/UUID value.
    Guid(Uuid),
    /// Date and time with timezone.
    DateTime(DateTime<Utc>),
    /// Nested record.
    Record(Box<Record>),
    /// Ordered collection of records, used for tree children.
    Records(Vec<Record>),
    /// Fallback for unrecognized JSON values.
    Json(serde_json::Value),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::DateTime(_) => "datetime",
            Value::Record(_) => "record",
            Value::Records(_) => "records",
            Value::Json(_) => "json",
        }
    }

    /// Returns the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Canonical string form used to match filter keys against candidates.
    ///
    /// Numbers render without a trailing `.0`, so `Int(20)`, `Float(20.0)`
    /// and `String("20")` all share the key `"20"`.
    pub fn key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Long(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Decimal(d) => d.normalize().to_string(),
            Value::String(s) => s.clone(),
            Value::Guid(g) => g.to_string(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            Value::Record(_) | Value::Records(_) | Value::Json(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    /// Natural ordering between two values.
    ///
    /// Numbers compare across their variants, strings lexicographically,
    /// and values of unrelated types by a fixed type rank. `Null` sorts
    /// after every present value.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Guid(a), Value::Guid(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => match self.type_rank().cmp(&other.type_rank()) {
                    Ordering::Equal => self.key_string().cmp(&other.key_string()),
                    unequal => unequal,
                },
            },
        }
    }

    /// Equality used by filter predicates: numeric values compare by
    /// magnitude, everything else by [`key_string`](Self::key_string).
    /// `Null` never matches.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.key_string() == other.key_string(),
        }
    }

    /// Returns `true` if the canonical string form contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        !self.is_null() && self.key_string().contains(needle)
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Decimal(_) => 1,
            Value::String(_) => 2,
            Value::Guid(_) => 3,
            Value::DateTime(_) => 4,
            Value::Record(_) => 5,
            Value::Records(_) => 6,
            Value::Json(_) => 7,
            Value::Null => 8,
        }
    }
}

// =============================================================================
// Deserialization
// =============================================================================

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Converts a serde_json::Value to our Value enum.
pub(crate) fn json_value_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Value::Int(small),
                    Err(_) => Value::Long(i),
                }
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Json(serde_json::Value::Number(n))
            }
        }
        serde_json::Value::String(s) => {
            if let Ok(uuid) = Uuid::parse_str(&s) {
                Value::Guid(uuid)
            } else if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                Value::DateTime(dt.with_timezone(&Utc))
            } else {
                Value::String(s)
            }
        }
        serde_json::Value::Array(items) => {
            // Arrays of objects are child rows; anything else stays opaque
            if items.iter().all(serde_json::Value::is_object) {
                let records = items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::Object(map) => Some(Record::from_json_map(map)),
                        _ => None,
                    })
                    .collect();
                Value::Records(records)
            } else {
                Value::Json(serde_json::Value::Array(items))
            }
        }
        serde_json::Value::Object(map) => Value::Record(Box::new(Record::from_json_map(map))),
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl From<Vec<Record>> for Value {
    fn from(v: Vec<Record>) -> Self {
        Value::Records(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        json_value_to_value(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}
