//! Scalar argument values

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::result::{Error, Result};

/// A scalar argument bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(Decimal),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Interpret a command-line argument.
    ///
    /// The raw string is read as JSON first so that `5`, `true` and `null`
    /// become typed values and `"5"` stays text. Anything that isn't valid
    /// JSON is taken verbatim as text. Numbers keep every digit the
    /// decimal type can hold; they never pass through a float.
    pub fn parse_arg(raw: &str) -> Result<Self> {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(json) => Self::try_from(json),
            Err(_) => Ok(Value::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl TryFrom<f64> for Value {
    type Error = Error;

    fn try_from(n: f64) -> Result<Self> {
        Decimal::try_from(n)
            .map(Value::Number)
            .map_err(|_| Error::validation(format!("{} cannot be bound as a number", n)))
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Number(n) => {
                let s = n.to_string();
                Decimal::from_str(&s)
                    .or_else(|_| Decimal::from_scientific(&s))
                    .map(Value::Number)
                    .map_err(|_| Error::validation(format!("{} cannot be bound as a number", s)))
            }
            other => Err(Error::validation(format!(
                "only scalar values can be bound, got {}",
                other
            ))),
        }
    }
}
