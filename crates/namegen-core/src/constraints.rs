use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Primary key definition preserving column order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Unique constraint definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UniqueConstraint {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Foreign key definition preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKey {
    /// Returns true when `column` participates in this key.
    pub fn covers(&self, column: &str) -> bool {
        self.columns
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(column))
    }
}

/// Table-level constraint definitions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    PrimaryKey(PrimaryKey),
    ForeignKey(ForeignKey),
    Unique(UniqueConstraint),
}
