use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Constraint, ForeignKey, PrimaryKey};
use crate::types::ColumnType;

/// Top-level schema snapshot describing the tables records are named in.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseSchema {
    /// Contract version for this snapshot format.
    pub schema_version: String,
    /// Namespaces captured in the snapshot.
    pub schemas: Vec<Schema>,
}

impl DatabaseSchema {
    /// Find a table by schema and table name, ignoring ASCII case.
    pub fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.schemas
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(schema))
            .and_then(|schema| {
                schema
                    .tables
                    .iter()
                    .find(|candidate| candidate.name.eq_ignore_ascii_case(table))
            })
    }
}

/// A namespace containing tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

/// A table whose rows can be named or looked up.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Table {
    /// Find a column by name, ignoring ASCII case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Primary key columns, empty when the table declares none.
    pub fn primary_key_columns(&self) -> &[String] {
        self.constraints
            .iter()
            .find_map(|constraint| match constraint {
                Constraint::PrimaryKey(PrimaryKey { columns, .. }) => Some(columns.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// The foreign key covering `column`, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::ForeignKey(fk) if fk.covers(column) => Some(fk),
            _ => None,
        })
    }
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub ordinal_position: i16,
    pub name: String,
    /// Fully-qualified property identifier rows may be keyed by instead of `name`.
    #[serde(default)]
    pub property_uri: Option<String>,
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
}

fn default_nullable() -> bool {
    true
}
