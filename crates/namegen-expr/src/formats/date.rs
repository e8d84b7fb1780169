use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use namegen_core::Value;

use crate::errors::EvalError;

const DEFAULT_PATTERN: &str = "yyyyMMdd";

/// A date pattern in `DateTimeFormatter` letter syntax, compiled to strftime.
#[derive(Debug, Clone, PartialEq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl Default for DatePattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_PATTERN.to_string(),
            strftime: "%Y%m%d".to_string(),
        }
    }
}

impl DatePattern {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let strftime = match named_pattern(source) {
            Some(named) => named.to_string(),
            None => translate(source)?,
        };
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(EvalError::InvalidPattern(source.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            strftime,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn apply(&self, value: Value) -> Result<Value, EvalError> {
        let mut out = String::new();
        let written = match &value {
            Value::Null => return Ok(Value::Null),
            Value::Time(time) => write!(out, "{}", time.format(&self.strftime)),
            other => {
                let ts = other.as_timestamp().ok_or_else(|| EvalError::NotDate {
                    value: other.to_string(),
                })?;
                write!(out, "{}", ts.format(&self.strftime))
            }
        };
        written.map_err(|_| EvalError::InvalidPattern(self.source.clone()))?;
        Ok(Value::Text(out))
    }
}

fn named_pattern(name: &str) -> Option<&'static str> {
    Some(match name {
        "BASIC_ISO_DATE" => "%Y%m%d",
        "ISO_LOCAL_DATE" | "ISO_DATE" => "%Y-%m-%d",
        "ISO_ORDINAL_DATE" => "%Y-%j",
        "ISO_WEEK_DATE" => "%G-W%V-%u",
        "ISO_LOCAL_TIME" | "ISO_TIME" => "%H:%M:%S%.f",
        "ISO_LOCAL_DATE_TIME" | "ISO_DATE_TIME" => "%Y-%m-%dT%H:%M:%S%.f",
        _ => return None,
    })
}

fn translate(pattern: &str) -> Result<String, EvalError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // quoted literal, '' is an escaped quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            if i >= chars.len() {
                return Err(EvalError::InvalidPattern(pattern.to_string()));
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&next| next == c).count();
        let spec = match (c, run) {
            ('y' | 'u', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('Y', 2) => "%g",
            ('Y', _) => "%G",
            ('M' | 'L', 1) => "%-m",
            ('M' | 'L', 2) => "%m",
            ('M' | 'L', 3) => "%b",
            ('M' | 'L', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', 1) => "%-j",
            ('D', _) => "%j",
            ('w', 1) => "%-V",
            ('w', _) => "%V",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('e', _) => "%u",
            ('a', _) => "%p",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', 1..=3) => "%3f",
            ('S', 4..=6) => "%6f",
            ('S', _) => "%9f",
            _ => return Err(EvalError::InvalidPattern(pattern.to_string())),
        };
        out.push_str(spec);
        i += run;
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use namegen_core::Value;

    use super::DatePattern;

    fn timestamp() -> Value {
        Value::Timestamp(
            NaiveDate::from_ymd_opt(2011, 12, 3)
                .and_then(|d| d.and_hms_opt(8, 30, 15))
                .expect("valid timestamp"),
        )
    }

    fn render(pattern: &str, value: Value) -> String {
        DatePattern::parse(pattern)
            .expect("pattern")
            .apply(value)
            .expect("apply")
            .to_string()
    }

    #[test]
    fn letter_patterns() {
        assert_eq!(render("yy-MM-dd", timestamp()), "11-12-03");
        assert_eq!(render("yyyy.MMM.d HH'h'", timestamp()), "2011.Dec.3 08h");
        assert_eq!(render("'100%' yyyy", timestamp()), "100% 2011");
        assert_eq!(render("HH:mm:ss", timestamp()), "08:30:15");
    }

    #[test]
    fn named_patterns() {
        assert_eq!(render("ISO_ORDINAL_DATE", timestamp()), "2011-337");
        assert_eq!(render("BASIC_ISO_DATE", timestamp()), "20111203");
        assert_eq!(render("ISO_LOCAL_DATE_TIME", timestamp()), "2011-12-03T08:30:15");
    }

    #[test]
    fn default_pattern_accepts_dates_and_text() {
        let pattern = DatePattern::default();
        let date = Value::Date(NaiveDate::from_ymd_opt(2011, 12, 3).expect("date"));
        assert_eq!(pattern.apply(date).expect("date").to_string(), "20111203");
        assert_eq!(
            pattern
                .apply(Value::from("2011-12-03 08:30:15"))
                .expect("text")
                .to_string(),
            "20111203"
        );
        assert!(pattern.apply(Value::from("not a date")).is_err());
        assert_eq!(pattern.apply(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn rejects_unknown_letters_and_open_quotes() {
        assert!(DatePattern::parse("yyyy-QQ").is_err());
        assert!(DatePattern::parse("yyyy 'open").is_err());
    }
}
