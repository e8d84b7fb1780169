use namegen_core::Value;

use crate::errors::EvalError;

const DIGIT_CHARS: &[char] = &['0', '#', ',', '.'];

/// A `DecimalFormat`-style number pattern such as `000,000` or `0.00`.
///
/// Literal text before and after the digit run is copied through. Rounding is
/// half-even.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberPattern {
    source: String,
    prefix: String,
    suffix: String,
    min_int: usize,
    grouping: Option<usize>,
    min_frac: usize,
    max_frac: usize,
}

impl NumberPattern {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let start = source.find(DIGIT_CHARS).unwrap_or(source.len());
        let body_len = source[start..]
            .find(|c: char| !DIGIT_CHARS.contains(&c))
            .unwrap_or(source.len() - start);
        let body = &source[start..start + body_len];

        let (int_part, frac_part) = match body.split_once('.') {
            Some((_, frac)) if frac.contains('.') => {
                return Err(EvalError::InvalidPattern(source.to_string()));
            }
            Some((int, frac)) => (int, frac),
            None => (body, ""),
        };
        if frac_part.contains(',') {
            return Err(EvalError::InvalidPattern(source.to_string()));
        }

        let grouping = int_part
            .rsplit_once(',')
            .map(|(_, tail)| tail.len())
            .filter(|size| *size > 0);
        let min_int = if body.is_empty() {
            1
        } else {
            int_part.matches('0').count()
        };

        Ok(Self {
            source: source.to_string(),
            prefix: source[..start].to_string(),
            suffix: source[start + body_len..].to_string(),
            min_int,
            grouping,
            min_frac: frac_part.matches('0').count(),
            max_frac: frac_part.len(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn apply(&self, value: Value) -> Result<Value, EvalError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Int(number) => Ok(Value::Text(self.format_int(number))),
            other => {
                let number = other.as_f64().ok_or_else(|| EvalError::NotNumeric {
                    value: other.to_string(),
                })?;
                Ok(Value::Text(self.format_f64(number)))
            }
        }
    }

    pub fn format_int(&self, number: i64) -> String {
        let digits = format!("{}{}", number.unsigned_abs(), "0".repeat(self.max_frac));
        self.render(number < 0, &digits)
    }

    pub fn format_f64(&self, number: f64) -> String {
        let scale = 10f64.powi(self.max_frac as i32);
        let scaled = (number.abs() * scale).round_ties_even();
        let digits = format!("{scaled:.0}");
        self.render(number < 0.0 && scaled != 0.0, &digits)
    }

    /// Render an unsigned digit string carrying `max_frac` implied decimals.
    fn render(&self, negative: bool, digits: &str) -> String {
        let padded = format!("{digits:0>width$}", width = self.max_frac + 1);
        let (int_digits, frac_digits) = padded.split_at(padded.len() - self.max_frac);

        let mut int_digits = int_digits.trim_start_matches('0').to_string();
        if int_digits.len() < self.min_int {
            int_digits = format!("{int_digits:0>width$}", width = self.min_int);
        }

        let mut frac_digits = frac_digits.to_string();
        while frac_digits.len() > self.min_frac && frac_digits.ends_with('0') {
            frac_digits.pop();
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            int_digits.push('0');
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.prefix);
        out.push_str(&group(&int_digits, self.grouping));
        if !frac_digits.is_empty() {
            out.push('.');
            out.push_str(&frac_digits);
        }
        out.push_str(&self.suffix);
        out
    }
}

fn group(digits: &str, size: Option<usize>) -> String {
    let Some(size) = size else {
        return digits.to_string();
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / size);
    for (position, c) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % size == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
