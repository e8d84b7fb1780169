use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use namegen_core::{LookupTarget, Row, Table, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("unsupported lookup table: {0}")]
    Unsupported(String),
    #[error("lookup backend failed: {0}")]
    Backend(String),
}

/// Fetches a field of the row a lookup column points at.
pub trait LookupResolver: Send + Sync {
    /// `Ok(None)` when no row matches `key` or the row lacks `field`.
    fn resolve(
        &self,
        target: &LookupTarget,
        key: &Value,
        field: &str,
    ) -> Result<Option<Value>, LookupError>;
}

/// Lookup rows held in memory, indexed by their single primary-key value.
#[derive(Debug, Default)]
pub struct InMemoryLookupResolver {
    rows_by_pk: RwLock<BTreeMap<String, HashMap<String, Row>>>,
}

impl InMemoryLookupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `rows` of `table` by primary key, converting key text to the
    /// key column's type so typed lookups match.
    pub fn ingest_table(
        &self,
        schema: &str,
        table: &Table,
        rows: &[Row],
    ) -> Result<usize, LookupError> {
        let [pk_column] = table.primary_key_columns() else {
            return Err(LookupError::Unsupported(format!(
                "{schema}.{} needs exactly one primary key column",
                table.name
            )));
        };
        let pk_type = table
            .column(pk_column)
            .map(|column| column.column_type.clone())
            .ok_or_else(|| {
                LookupError::Unsupported(format!(
                    "primary key column not found: {schema}.{}.{pk_column}",
                    table.name
                ))
            })?;

        let mut row_map = HashMap::with_capacity(rows.len());
        for row in rows {
            let Some(value) = row.get(pk_column).filter(|value| !value.is_blank()) else {
                continue;
            };
            let value = value
                .coerce_to(&pk_type)
                .map_err(|err| LookupError::Unsupported(err.to_string()))?;
            row_map.insert(value_key(&value), row.clone());
        }
        let count = row_map.len();

        let mut tables = self
            .rows_by_pk
            .write()
            .map_err(|_| LookupError::Backend("lookup index lock poisoned".to_string()))?;
        tables.insert(table_key(schema, &table.name), row_map);
        Ok(count)
    }
}

impl LookupResolver for InMemoryLookupResolver {
    fn resolve(
        &self,
        target: &LookupTarget,
        key: &Value,
        field: &str,
    ) -> Result<Option<Value>, LookupError> {
        let tables = self
            .rows_by_pk
            .read()
            .map_err(|_| LookupError::Backend("lookup index lock poisoned".to_string()))?;
        Ok(tables
            .get(&table_key(&target.schema, &target.table))
            .and_then(|rows| rows.get(&value_key(key)))
            .and_then(|row| row.get(field))
            .cloned())
    }
}

fn table_key(schema: &str, table: &str) -> String {
    format!("{schema}.{table}").to_lowercase()
}

fn value_key(value: &Value) -> String {
    match value {
        Value::Null => "<null>".to_string(),
        Value::Date(value) => value.format("%Y-%m-%d").to_string(),
        Value::Timestamp(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
        other => other.to_string(),
    }
}
