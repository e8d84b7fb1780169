use chrono::NaiveDate;
use namegen_core::{CaseInsensitiveMap, Value};

use crate::errors::EvalError;
use crate::formats::{CounterPeriod, Format};
use crate::model::{CounterPart, ParsedExpression, Part, Token};

/// Supplies token values and counter draws during evaluation.
pub trait EvalContext {
    /// Value for `token`'s path, `None` when the context has no such key.
    fn value(&self, token: &Token) -> Option<Value>;

    /// Next count for a sample counter bound to `date`.
    fn sample_count(&mut self, period: CounterPeriod, date: NaiveDate) -> Result<i64, EvalError> {
        let _ = date;
        Err(EvalError::Counter(format!(
            "{} is not available in this context",
            period.token_name()
        )))
    }

    /// Next value of the `withCounter` sequence for an evaluated `prefix`.
    fn counter_value(&mut self, counter: &CounterPart, prefix: &str) -> Result<i64, EvalError> {
        let _ = counter;
        Err(EvalError::Counter(format!(
            "withCounter is not available in this context (prefix '{prefix}')"
        )))
    }
}

impl EvalContext for CaseInsensitiveMap<Value> {
    fn value(&self, token: &Token) -> Option<Value> {
        self.get(&token.key()).cloned()
    }
}

impl ParsedExpression {
    /// Render the expression. Null substitutions render blank.
    pub fn eval(&self, ctx: &mut dyn EvalContext) -> Result<String, EvalError> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Constant(text) => out.push_str(text),
                Part::Token(token) => out.push_str(&token.eval(ctx)?.to_string()),
                Part::Counter(counter) => out.push_str(&counter.eval(ctx)?),
            }
        }
        Ok(out)
    }
}

impl Token {
    pub fn eval(&self, ctx: &mut dyn EvalContext) -> Result<Value, EvalError> {
        let mut value = ctx.value(self).unwrap_or_default();
        for format in &self.formats {
            value = match format {
                Format::SampleCount(period) => {
                    if value.is_blank() {
                        Value::Null
                    } else {
                        let date = value.as_date().ok_or_else(|| EvalError::NotDate {
                            value: value.to_string(),
                        })?;
                        Value::Int(ctx.sample_count(*period, date)?)
                    }
                }
                other => other.apply(value)?,
            };
        }
        Ok(value)
    }
}

impl CounterPart {
    /// `prefix + counter`; blank when the prefix renders blank.
    pub fn eval(&self, ctx: &mut dyn EvalContext) -> Result<String, EvalError> {
        let prefix = self.prefix.eval(ctx)?;
        if prefix.is_empty() {
            return Ok(String::new());
        }
        let count = ctx.counter_value(self, &prefix)?;
        let rendered = match &self.number_format {
            Some(pattern) => pattern.format_int(count),
            None => count.to_string(),
        };
        Ok(format!("{prefix}{rendered}"))
    }
}
