use std::fmt;

use crate::formats::{Format, NumberPattern};

/// A parsed name expression: constant text and substitution parts in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpression {
    pub(crate) source: String,
    pub(crate) parts: Vec<Part>,
}

impl ParsedExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// True when the expression contains no substitutions.
    pub fn is_constant(&self) -> bool {
        self.parts
            .iter()
            .all(|part| matches!(part, Part::Constant(_)))
    }

    /// Every part with counter parts replaced by the parts of their prefix,
    /// recursively.
    pub fn deep_parts(&self) -> Vec<&Part> {
        let mut out = Vec::new();
        collect_deep(&self.parts, &mut out);
        out
    }

    /// Every token, including those nested in counter prefixes.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.deep_parts().into_iter().filter_map(|part| match part {
            Part::Token(token) => Some(token),
            _ => None,
        })
    }

    /// Every counter part, outer counters before those nested in their prefix.
    pub fn counters(&self) -> impl Iterator<Item = &CounterPart> {
        let mut out = Vec::new();
        collect_counters(&self.parts, &mut out);
        out.into_iter()
    }
}

fn collect_counters<'a>(parts: &'a [Part], out: &mut Vec<&'a CounterPart>) {
    for part in parts {
        if let Part::Counter(counter) = part {
            out.push(counter);
            collect_counters(&counter.prefix.parts, out);
        }
    }
}

fn collect_deep<'a>(parts: &'a [Part], out: &mut Vec<&'a Part>) {
    for part in parts {
        match part {
            Part::Counter(counter) => collect_deep(&counter.prefix.parts, out),
            other => out.push(other),
        }
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Constant(String),
    Token(Token),
    Counter(CounterPart),
}

/// A `${path:format...}` substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub(crate) source: String,
    pub(crate) path: Vec<String>,
    pub(crate) formats: Vec<Format>,
}

impl Token {
    /// The token body as written between `${` and `}`.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn root(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }

    /// Second path segment of a `root/field` reference.
    pub fn field(&self) -> Option<&str> {
        self.path.get(1).map(String::as_str)
    }

    /// Context key the token reads: the path joined with `/`.
    pub fn key(&self) -> String {
        self.path.join("/")
    }

    pub fn formats(&self) -> &[Format] {
        &self.formats
    }
}

/// `${<prefix>:withCounter(start?, 'numberFormat'?, NoGap?)}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterPart {
    pub(crate) prefix: ParsedExpression,
    pub(crate) start: Option<i64>,
    pub(crate) number_format: Option<NumberPattern>,
    pub(crate) no_gap: bool,
}

impl CounterPart {
    pub fn prefix(&self) -> &ParsedExpression {
        &self.prefix
    }

    /// First value the counter should hand out for a fresh prefix.
    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn number_format(&self) -> Option<&str> {
        self.number_format.as_ref().map(NumberPattern::source)
    }

    /// Counter values must be issued without gaps (no block preallocation).
    pub fn no_gap(&self) -> bool {
        self.no_gap
    }
}
