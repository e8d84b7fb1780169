use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DatabaseSchema, Table};
use crate::types::ColumnType;

/// Table a lookup column points at, addressed through its single primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTarget {
    pub schema: String,
    pub table: String,
    pub pk_column: String,
    pub pk_type: ColumnType,
}

/// Resolution of a column name against the owning table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBinding {
    pub name: String,
    pub property_uri: Option<String>,
    pub column_type: ColumnType,
    /// The column carries a foreign key.
    pub is_lookup: bool,
    /// Present only when the referenced table has exactly one primary-key column.
    pub lookup_target: Option<LookupTarget>,
}

/// Column naming pair used to expose long-form row keys under short names.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub name: String,
    pub property_uri: Option<String>,
}

/// Narrow view of the owning table needed by expression analysis and
/// context assembly.
pub trait SchemaResolver: Send + Sync {
    /// Resolve by column name or property identifier, ignoring case.
    fn resolve_column(&self, name: &str) -> Option<ColumnBinding>;
    fn columns(&self) -> Vec<ColumnRef>;
}

/// `SchemaResolver` over one table of a schema snapshot.
#[derive(Debug, Clone)]
pub struct TableSchemaResolver {
    bindings: Vec<ColumnBinding>,
}

impl TableSchemaResolver {
    pub fn new(snapshot: &DatabaseSchema, schema: &str, table: &str) -> Result<Self> {
        let owner = snapshot
            .table(schema, table)
            .ok_or_else(|| Error::NotFound(format!("table {schema}.{table}")))?;

        let bindings = owner
            .columns
            .iter()
            .map(|column| {
                let fk = owner
                    .foreign_key_for(&column.name)
                    .filter(|fk| fk.columns.len() == 1);
                let lookup_target = fk.and_then(|fk| {
                    let target = snapshot.table(&fk.referenced_schema, &fk.referenced_table)?;
                    single_pk_target(&fk.referenced_schema, target)
                });
                ColumnBinding {
                    name: column.name.clone(),
                    property_uri: column.property_uri.clone(),
                    column_type: column.column_type.clone(),
                    is_lookup: fk.is_some(),
                    lookup_target,
                }
            })
            .collect();

        Ok(Self { bindings })
    }
}

fn single_pk_target(schema: &str, table: &Table) -> Option<LookupTarget> {
    let [pk_column] = table.primary_key_columns() else {
        return None;
    };
    let column = table.column(pk_column)?;
    Some(LookupTarget {
        schema: schema.to_string(),
        table: table.name.clone(),
        pk_column: column.name.clone(),
        pk_type: column.column_type.clone(),
    })
}

impl SchemaResolver for TableSchemaResolver {
    fn resolve_column(&self, name: &str) -> Option<ColumnBinding> {
        self.bindings
            .iter()
            .find(|binding| {
                binding.name.eq_ignore_ascii_case(name)
                    || binding
                        .property_uri
                        .as_deref()
                        .is_some_and(|uri| uri.eq_ignore_ascii_case(name))
            })
            .cloned()
    }

    fn columns(&self) -> Vec<ColumnRef> {
        self.bindings
            .iter()
            .map(|binding| ColumnRef {
                name: binding.name.clone(),
                property_uri: binding.property_uri.clone(),
            })
            .collect()
    }
}
