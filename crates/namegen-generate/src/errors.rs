use namegen_expr::ParseError;
use namegen_sequence::SequenceError;
use thiserror::Error;

/// Errors raised while building a generator or naming rows.
#[derive(Debug, Error)]
pub enum NameGenError {
    /// The expression uses a shape this generator cannot evaluate.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("invalid expression: {0}")]
    InvalidExpression(#[from] ParseError),
    /// Row-scoped failure; `row_number` is 1-based within the batch.
    #[error("failed to generate name for row {row_number}: {message}")]
    Generation { row_number: usize, message: String },
    #[error("Duplicate name '{name}' on row {row_number}")]
    DuplicateName { name: String, row_number: usize },
    #[error("generation state is closed")]
    Closed,
    #[error("sequence error: {0}")]
    Sequence(#[from] SequenceError),
}

impl NameGenError {
    pub(crate) fn row(row_number: usize, message: impl Into<String>) -> Self {
        NameGenError::Generation {
            row_number,
            message: message.into(),
        }
    }

    /// Row the error belongs to, for row-scoped errors.
    pub fn row_number(&self) -> Option<usize> {
        match self {
            NameGenError::Generation { row_number, .. }
            | NameGenError::DuplicateName { row_number, .. } => Some(*row_number),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, NameGenError::DuplicateName { .. })
    }
}

pub type Result<T> = std::result::Result<T, NameGenError>;
