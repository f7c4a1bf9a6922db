//! Column types and stored values.
//!
//! A table declares each column as `int`, `bool` or `string`. Raw input
//! arrives as text and is coerced into a [`Value`] of the declared type
//! before it is stored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use flatdb_common::{FlatError, FlatResult, TRUTHY_VALUES};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 64-bit signed integer.
    Int,
    /// Boolean.
    Bool,
    /// UTF-8 text.
    Str,
}

impl ColumnType {
    /// Returns the name used in schemas and the catalog file.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Bool => "bool",
            ColumnType::Str => "string",
        }
    }

    /// Coerces raw text into a value of this type.
    ///
    /// - `int`: decimal integer, surrounding whitespace ignored
    /// - `bool`: `true` iff the lowercased text is one of `true`, `1`, `yes`
    /// - `string`: the text unchanged
    ///
    /// Only `int` can fail.
    pub fn coerce(&self, column: &str, raw: &str) -> FlatResult<Value> {
        match self {
            ColumnType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| FlatError::InvalidValue {
                    column: column.to_string(),
                    column_type: self.as_str().to_string(),
                    value: raw.to_string(),
                }),
            ColumnType::Bool => {
                let lowered = raw.to_lowercase();
                Ok(Value::Bool(TRUTHY_VALUES.contains(&lowered.as_str())))
            }
            ColumnType::Str => Ok(Value::Str(raw.to_string())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = FlatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(ColumnType::Int),
            "bool" => Ok(ColumnType::Bool),
            "string" => Ok(ColumnType::Str),
            other => Err(FlatError::validation(format!(
                "unknown column type '{other}' (expected int, bool or string)"
            ))),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A stored field value.
///
/// Serialized as the bare JSON scalar (`30`, `true`, `"Ann"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// String value.
    Str(String),
}

impl Value {
    /// Returns the column type this value belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::Bool(_) => ColumnType::Bool,
            Value::Str(_) => ColumnType::Str,
        }
    }
}

/// The string representation predicates compare against.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
