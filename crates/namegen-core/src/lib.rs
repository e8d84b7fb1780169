//! Core contracts shared by the namegen crates.
//!
//! Defines the schema snapshot model consumed by name-expression analysis,
//! the narrow `SchemaResolver` capability, the dynamic `Value` type used for
//! row data, and the case-insensitive map used for rows and registries.

pub mod collections;
pub mod constraints;
pub mod error;
pub mod period;
pub mod resolver;
pub mod schema;
pub mod types;
pub mod validation;
pub mod value;

pub use collections::CaseInsensitiveMap;
pub use constraints::{Constraint, ForeignKey, PrimaryKey, UniqueConstraint};
pub use error::{Error, Result};
pub use period::CounterPeriod;
pub use resolver::{ColumnBinding, ColumnRef, LookupTarget, SchemaResolver, TableSchemaResolver};
pub use schema::{Column, DatabaseSchema, Schema, Table};
pub use types::{ColumnType, TypeKind};
pub use validation::validate_schema;
pub use value::Value;

/// Current contract version for `schema.json` snapshots.
pub const SCHEMA_VERSION: &str = "0.1";

/// A single record to be named, keyed case-insensitively by column.
pub type Row = CaseInsensitiveMap<Value>;
