//! Name expression parsing and evaluation.
//!
//! A name expression is literal text interleaved with `${...}` tokens. Tokens
//! reference context values by path and may carry a chain of formats, e.g.
//! `${now:date('yy-MM-dd')}` or `${lab/code:trim}`. A token whose body ends
//! in `:withCounter(...)` becomes a counter part whose prefix is itself an
//! expression.

pub mod errors;
pub mod eval;
pub mod formats;
pub mod model;
pub mod parser;

pub use errors::{EvalError, ParseError};
pub use eval::EvalContext;
pub use formats::{CounterPeriod, Format};
pub use model::{CounterPart, ParsedExpression, Part, Token};
pub use parser::parse;
