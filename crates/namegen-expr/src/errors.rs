use thiserror::Error;

/// Errors raised while parsing a name expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no closing brace for substitution starting at position {0}")]
    UnmatchedOpen(usize),
    #[error("unmatched closing brace at position {0}")]
    UnmatchedClose(usize),
    #[error("empty substitution at position {0}")]
    EmptyToken(usize),
    #[error("nested substitution is only supported as a withCounter prefix: {0}")]
    NestedToken(String),
    #[error("unknown format '{0}'")]
    UnknownFormat(String),
    #[error("invalid arguments for format '{format}': {message}")]
    InvalidArguments { format: String, message: String },
    #[error("invalid withCounter expression '{0}'")]
    InvalidCounter(String),
}

/// Errors raised while evaluating a parsed expression against a context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("value '{value}' is not numeric")]
    NotNumeric { value: String },
    #[error("value '{value}' is not a date")]
    NotDate { value: String },
    #[error("invalid format pattern '{0}'")]
    InvalidPattern(String),
    #[error("counter error: {0}")]
    Counter(String),
}
