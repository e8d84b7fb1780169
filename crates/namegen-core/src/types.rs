use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declared type of a column (e.g. `integer`, `character varying(64)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    pub data_type: String,
}

/// Coarse value family used when converting row values to a column's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Integer,
    Numeric,
    Boolean,
    Date,
    Timestamp,
    Text,
}

impl ColumnType {
    pub fn new(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
        }
    }

    /// Base type name without modifiers, lowercased.
    pub fn normalized(&self) -> String {
        self.data_type
            .split('(')
            .next()
            .unwrap_or(&self.data_type)
            .trim()
            .to_lowercase()
    }

    pub fn kind(&self) -> TypeKind {
        match self.normalized().as_str() {
            "smallint" | "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "serial"
            | "bigserial" => TypeKind::Integer,
            "numeric" | "decimal" | "real" | "double precision" | "float" | "float4"
            | "float8" => TypeKind::Numeric,
            "boolean" | "bool" => TypeKind::Boolean,
            "date" => TypeKind::Date,
            "timestamp" | "timestamp with time zone" | "timestamp without time zone"
            | "timestamptz" => TypeKind::Timestamp,
            _ => TypeKind::Text,
        }
    }

    pub fn is_string_type(&self) -> bool {
        self.kind() == TypeKind::Text
    }
}
