use thiserror::Error;

/// Core error type shared across namegen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema snapshot violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A value could not be converted to the requested type.
    #[error("conversion error: {0}")]
    Conversion(String),
    /// A requested table or column does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Convenience alias for results returned by namegen crates.
pub type Result<T> = std::result::Result<T, Error>;
