use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ColumnType, TypeKind};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Dynamically typed cell value carried by rows and substitution contexts.
///
/// `Display` is the substitution rendering used inside generated names and
/// must stay locale independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, empty text, or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Calendar date carried by this value, parsing ISO text when needed.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            Value::Timestamp(ts) => Some(ts.date()),
            Value::Text(text) => parse_timestamp(text.trim())
                .map(|ts| ts.date())
                .or_else(|| parse_date(text.trim())),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(date) => date.and_hms_opt(0, 0, 0),
            Value::Text(text) => parse_timestamp(text.trim())
                .or_else(|| parse_date(text.trim()).and_then(|d| d.and_hms_opt(0, 0, 0))),
            _ => None,
        }
    }

    /// Convert text to the native type of `column_type`.
    ///
    /// Non-text values and text targets are returned unchanged.
    pub fn coerce_to(&self, column_type: &ColumnType) -> Result<Value> {
        let Value::Text(text) = self else {
            return Ok(self.clone());
        };
        let trimmed = text.trim();
        let failed = || {
            Error::Conversion(format!(
                "cannot convert '{text}' to {}",
                column_type.data_type
            ))
        };
        match column_type.kind() {
            TypeKind::Text => Ok(self.clone()),
            TypeKind::Integer => trimmed.parse().map(Value::Int).map_err(|_| failed()),
            TypeKind::Numeric => trimmed.parse().map(Value::Float).map_err(|_| failed()),
            TypeKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
                "false" | "f" | "no" | "n" | "0" => Ok(Value::Bool(false)),
                _ => Err(failed()),
            },
            TypeKind::Date => parse_date(trimmed).map(Value::Date).ok_or_else(failed),
            TypeKind::Timestamp => parse_timestamp(trimmed)
                .map(Value::Timestamp)
                .ok_or_else(failed),
        }
    }

    /// Convert to plain JSON, rendering temporal values with `Display`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::from(*value),
            Value::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(text) => serde_json::Value::String(text.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(text) => f.write_str(text),
            Value::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Value::Time(time) => write!(f, "{}", time.format(TIME_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Value::List(items) => {
                f.write_str("[")?;
                for (position, item) in items.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(*value),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Value::Int)
                .or_else(|| number.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(text) => Value::Text(text.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(_) => Value::Text(value.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::Value;
    use crate::types::ColumnType;

    #[test]
    fn renders_like_default_string_conversion() {
        let ts = NaiveDate::from_ymd_opt(2011, 12, 3)
            .and_then(|d| d.and_hms_opt(8, 30, 15))
            .expect("valid timestamp");
        assert_eq!(Value::Timestamp(ts).to_string(), "2011-12-03 08:30:15");
        assert_eq!(Value::Date(ts.date()).to_string(), "20111203");
        assert_eq!(Value::Time(ts.time()).to_string(), "08:30:15");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(123456.789).to_string(), "123456.789");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Int(2)]).to_string(),
            "[a, 2]"
        );
    }

    #[test]
    fn coerces_text_to_key_type() {
        let int = ColumnType::new("integer");
        assert_eq!(Value::from(" 42 ").coerce_to(&int).expect("int"), Value::Int(42));
        assert!(Value::from("abc").coerce_to(&int).is_err());

        let text = ColumnType::new("character varying(64)");
        assert_eq!(
            Value::from("42").coerce_to(&text).expect("text"),
            Value::from("42")
        );
        assert_eq!(Value::Int(7).coerce_to(&text).expect("non-text"), Value::Int(7));
    }

    #[test]
    fn blank_detection() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("  ").is_blank());
        assert!(!Value::Int(0).is_blank());
    }
}
