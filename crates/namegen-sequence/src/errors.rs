use std::io;

use thiserror::Error;

use crate::key::SequenceKey;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("sequence {0} overflowed")]
    Overflow(SequenceKey),
    #[error("invalid reservation size {0}")]
    InvalidCount(i64),
    #[error("sequence state lock poisoned")]
    Poisoned,
    #[error("invalid sequence store state: {0}")]
    Invalid(String),
}

pub type SequenceResult<T> = Result<T, SequenceError>;
