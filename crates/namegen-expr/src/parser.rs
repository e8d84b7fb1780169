use regex::Regex;

use crate::errors::ParseError;
use crate::formats::{Format, NumberPattern};
use crate::model::{CounterPart, ParsedExpression, Part, Token};

const NO_GAP_PARAM: &str = "NoGap";

/// Parse a name expression into constant and substitution parts.
pub fn parse(source: &str) -> Result<ParsedExpression, ParseError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = source;
    let mut offset = 0;
    let mut literal_depth = 0usize;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("${") {
            let body_len = matching_brace(after).ok_or(ParseError::UnmatchedOpen(offset))?;
            let body = &after[..body_len];
            if body.trim().is_empty() {
                return Err(ParseError::EmptyToken(offset));
            }
            if !literal.is_empty() {
                parts.push(Part::Constant(std::mem::take(&mut literal)));
            }
            parts.push(parse_substitution(body)?);
            let consumed = 2 + body_len + 1;
            rest = &rest[consumed..];
            offset += consumed;
            continue;
        }

        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };
        match c {
            '{' => literal_depth += 1,
            '}' if literal_depth == 0 => return Err(ParseError::UnmatchedClose(offset)),
            '}' => literal_depth -= 1,
            _ => {}
        }
        literal.push(c);
        rest = chars.as_str();
        offset += c.len_utf8();
    }

    if !literal.is_empty() {
        parts.push(Part::Constant(literal));
    }

    Ok(ParsedExpression {
        source: source.to_string(),
        parts,
    })
}

/// Byte length of the token body, i.e. the index of the `}` closing an
/// already-consumed `${`.
fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(index),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

struct CounterSyntax<'a> {
    prefix: &'a str,
    start: &'a str,
    number_format: &'a str,
    param: &'a str,
}

fn counter_syntax(body: &str) -> Option<CounterSyntax<'_>> {
    let re = Regex::new(
        r"(?is)^(.+):withCounter(?:\(\s*(\d*)\s*,?\s*'?([0-9#,.]*)'?\s*,?\s*'?([a-zA-Z]*)'?\s*\))?$",
    )
    .ok()?;
    let captures = re.captures(body)?;
    let group = |index: usize| captures.get(index).map_or("", |m| m.as_str());
    Some(CounterSyntax {
        prefix: group(1),
        start: group(2),
        number_format: group(3),
        param: group(4),
    })
}

fn parse_substitution(body: &str) -> Result<Part, ParseError> {
    if let Some(syntax) = counter_syntax(body) {
        let start = match syntax.start {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| ParseError::InvalidCounter(body.to_string()))?,
            ),
        };
        let number_format = match syntax.number_format {
            "" => None,
            raw => Some(
                NumberPattern::parse(raw)
                    .map_err(|_| ParseError::InvalidCounter(body.to_string()))?,
            ),
        };
        let no_gap = match syntax.param {
            "" => false,
            param if param.eq_ignore_ascii_case(NO_GAP_PARAM) => true,
            _ => return Err(ParseError::InvalidCounter(body.to_string())),
        };

        return Ok(Part::Counter(CounterPart {
            prefix: parse(syntax.prefix)?,
            start,
            number_format,
            no_gap,
        }));
    }

    if body.contains("${") {
        return Err(ParseError::NestedToken(body.to_string()));
    }

    let mut segments = split_outside_quotes(body, ':').into_iter();
    let path_source = segments.next().unwrap_or_default();
    let path: Vec<String> = path_source.split('/').map(str::to_string).collect();
    if path.iter().any(|segment| segment.trim().is_empty()) {
        return Err(ParseError::EmptyToken(0));
    }

    let formats = segments
        .map(|segment| parse_format(&segment))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Part::Token(Token {
        source: body.to_string(),
        path,
        formats,
    }))
}

fn parse_format(segment: &str) -> Result<Format, ParseError> {
    let segment = segment.trim();
    let (name, args) = match segment.split_once('(') {
        Some((name, tail)) => {
            let inner = tail.strip_suffix(')').ok_or_else(|| ParseError::InvalidArguments {
                format: name.trim().to_string(),
                message: "missing closing parenthesis".to_string(),
            })?;
            let args = if inner.trim().is_empty() {
                Vec::new()
            } else {
                split_outside_quotes(inner, ',')
                    .into_iter()
                    .map(|arg| unquote(arg.trim()))
                    .collect()
            };
            (name.trim(), args)
        }
        None => (segment, Vec::new()),
    };
    Format::from_call(name, args)
}

/// Split on `separator` ignoring separators inside single quotes or parentheses.
fn split_outside_quotes(input: &str, separator: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut depth = 0usize;

    for c in input.chars() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            _ if c == separator && !quoted && depth == 0 => {
                out.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    out.push(current);
    out
}

fn unquote(arg: &str) -> String {
    arg.strip_prefix('\'')
        .and_then(|inner| inner.strip_suffix('\''))
        .unwrap_or(arg)
        .to_string()
}
