//! Inspect a schema snapshot the way name generation sees it.
//!
//! `snapshot_lookups json-schema` prints the JSON Schema of the snapshot
//! format. `snapshot_lookups <schema.json> <schema.table>` validates a
//! snapshot and prints each column of the table with the lookup target its
//! `${column/field}` tokens resolve through.

use std::error::Error;

use namegen_core::{DatabaseSchema, SchemaResolver, TableSchemaResolver, validate_schema};
use schemars::schema_for;
use serde_json::{Value, json};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = match args.as_slice() {
        [command] if command == "json-schema" => serde_json::to_value(schema_for!(DatabaseSchema))?,
        [path, table] => lookups(path, table)?,
        _ => return Err("usage: snapshot_lookups json-schema | <schema.json> <schema.table>".into()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn lookups(path: &str, qualified: &str) -> Result<Value, Box<dyn Error>> {
    let snapshot: DatabaseSchema = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    validate_schema(&snapshot)?;
    let (schema, table) = qualified
        .split_once('.')
        .ok_or("table must be given as schema.table")?;
    let resolver = TableSchemaResolver::new(&snapshot, schema, table)?;

    let columns: Vec<Value> = resolver
        .columns()
        .into_iter()
        .filter_map(|column| resolver.resolve_column(&column.name))
        .map(|binding| {
            json!({
                "column": binding.name,
                "property_uri": binding.property_uri,
                "data_type": binding.column_type.data_type,
                "is_lookup": binding.is_lookup,
                "lookup_target": binding.lookup_target,
            })
        })
        .collect();
    Ok(json!({ "table": qualified, "columns": columns }))
}
