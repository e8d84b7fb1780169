//! Substitution formats applied to token values.

mod date;
mod number;

pub use date::DatePattern;
pub use number::NumberPattern;

pub use namegen_core::CounterPeriod;
use namegen_core::Value;

use crate::errors::{EvalError, ParseError};

#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    Date(DatePattern),
    Number(NumberPattern),
    Trim,
    DefaultValue(String),
    Prefix(String),
    Suffix(String),
    Join(String),
    First,
    Last,
    Rest,
    /// Lower bound for the value; read during analysis, a no-op when rendering.
    MinValue(i64),
    /// Bound sample counter keyed by the token's date value.
    SampleCount(CounterPeriod),
}

impl Format {
    pub(crate) fn from_call(name: &str, args: Vec<String>) -> Result<Self, ParseError> {
        let invalid = |message: &str| ParseError::InvalidArguments {
            format: name.to_string(),
            message: message.to_string(),
        };
        let single = |args: Vec<String>| -> Result<String, ParseError> {
            match <[String; 1]>::try_from(args) {
                Ok([arg]) => Ok(arg),
                Err(_) => Err(invalid("expected exactly one argument")),
            }
        };
        let none = |args: &[String], format: Format| {
            if args.is_empty() {
                Ok(format)
            } else {
                Err(invalid("takes no arguments"))
            }
        };

        if let Some(period) = CounterPeriod::from_token_name(name) {
            return none(&args, Format::SampleCount(period));
        }

        match name.to_ascii_lowercase().as_str() {
            "date" => {
                let pattern = match args.len() {
                    0 => DatePattern::default(),
                    1 => DatePattern::parse(&args[0]).map_err(|err| invalid(&err.to_string()))?,
                    _ => return Err(invalid("expected at most one argument")),
                };
                Ok(Format::Date(pattern))
            }
            "number" => {
                let pattern = single(args)?;
                NumberPattern::parse(&pattern)
                    .map(Format::Number)
                    .map_err(|err| invalid(&err.to_string()))
            }
            "trim" => none(&args, Format::Trim),
            "defaultvalue" => single(args).map(Format::DefaultValue),
            "prefix" => single(args).map(Format::Prefix),
            "suffix" => single(args).map(Format::Suffix),
            "join" => match args.len() {
                0 => Ok(Format::Join(String::new())),
                _ => single(args).map(Format::Join),
            },
            "first" => none(&args, Format::First),
            "last" => none(&args, Format::Last),
            "rest" => none(&args, Format::Rest),
            "minvalue" => {
                let raw = single(args)?;
                raw.trim()
                    .parse()
                    .map(Format::MinValue)
                    .map_err(|_| invalid("expected an integer"))
            }
            _ => Err(ParseError::UnknownFormat(name.to_string())),
        }
    }

    /// Apply this format to a value. `SampleCount` needs the evaluation
    /// context and is handled by the evaluator.
    pub(crate) fn apply(&self, value: Value) -> Result<Value, EvalError> {
        match self {
            Format::Date(pattern) => pattern.apply(value),
            Format::Number(pattern) => pattern.apply(value),
            Format::Trim => Ok(match value {
                Value::Null => Value::Null,
                Value::Text(text) => Value::Text(text.trim().to_string()),
                other => Value::Text(other.to_string().trim().to_string()),
            }),
            Format::DefaultValue(default) => Ok(if is_empty(&value) {
                Value::Text(default.clone())
            } else {
                value
            }),
            Format::Prefix(prefix) => Ok(if is_empty(&value) {
                value
            } else {
                Value::Text(format!("{prefix}{value}"))
            }),
            Format::Suffix(suffix) => Ok(if is_empty(&value) {
                value
            } else {
                Value::Text(format!("{value}{suffix}"))
            }),
            Format::Join(separator) => Ok(match value {
                Value::List(items) if items.is_empty() => Value::Null,
                Value::List(items) => Value::Text(
                    items
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(separator),
                ),
                other => other,
            }),
            Format::First => Ok(match value {
                Value::List(items) => items.into_iter().next().unwrap_or_default(),
                other => other,
            }),
            Format::Last => Ok(match value {
                Value::List(items) => items.into_iter().last().unwrap_or_default(),
                other => other,
            }),
            Format::Rest => Ok(match value {
                Value::List(items) => Value::List(items.into_iter().skip(1).collect()),
                _ => Value::Null,
            }),
            Format::MinValue(_) | Format::SampleCount(_) => Ok(value),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(text) => text.is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use namegen_core::Value;

    use super::{CounterPeriod, Format};

    fn call(name: &str, args: &[&str]) -> Format {
        Format::from_call(name, args.iter().map(|arg| arg.to_string()).collect())
            .expect("valid format")
    }

    #[test]
    fn counter_names_become_bound_counter_formats() {
        assert_eq!(
            call("weeklySampleCount", &[]),
            Format::SampleCount(CounterPeriod::Weekly)
        );
        assert!(matches!(
            Format::from_call("hourlySampleCount", Vec::new()),
            Err(crate::errors::ParseError::UnknownFormat(_))
        ));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Format::from_call("trim", vec!["x".to_string()]).is_err());
        assert!(Format::from_call("prefix", Vec::new()).is_err());
        assert!(Format::from_call("minValue", vec!["ten".to_string()]).is_err());
        assert!(Format::from_call("shout", Vec::new()).is_err());
    }

    #[test]
    fn collection_formats_on_scalars() {
        let a = Value::from("A");
        assert_eq!(call("first", &[]).apply(a.clone()), Ok(a.clone()));
        assert_eq!(call("rest", &[]).apply(a.clone()), Ok(Value::Null));
        assert_eq!(call("join", &["-"]).apply(a.clone()), Ok(a));
    }
}
