use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::Constraint;
use crate::error::{Error, Result};
use crate::schema::DatabaseSchema;

type Catalog = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Validate internal consistency of a schema snapshot.
///
/// Names compare case-insensitively, matching how rows and tokens address
/// columns. This checks:
/// - duplicate schemas/tables/columns/property identifiers
/// - primary key columns exist
/// - foreign key columns and referenced targets exist
pub fn validate_schema(schema: &DatabaseSchema) -> Result<()> {
    let catalog = build_catalog(schema)?;

    for db_schema in &schema.schemas {
        for table in &db_schema.tables {
            let columns = lookup(&catalog, &db_schema.name, &table.name).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "missing table in catalog: {}.{}",
                    db_schema.name, table.name
                ))
            })?;
            let require = |kind: &str, column: &String| -> Result<()> {
                if columns.contains(&column.to_lowercase()) {
                    Ok(())
                } else {
                    Err(Error::InvalidSchema(format!(
                        "{kind} column not found: {}.{}.{}",
                        db_schema.name, table.name, column
                    )))
                }
            };

            for constraint in &table.constraints {
                match constraint {
                    Constraint::PrimaryKey(pk) => {
                        pk.columns
                            .iter()
                            .try_for_each(|column| require("primary key", column))?;
                    }
                    Constraint::Unique(unique) => {
                        unique
                            .columns
                            .iter()
                            .try_for_each(|column| require("unique", column))?;
                    }
                    Constraint::ForeignKey(fk) => {
                        fk.columns
                            .iter()
                            .try_for_each(|column| require("foreign key", column))?;

                        if fk.columns.len() != fk.referenced_columns.len() {
                            return Err(Error::InvalidSchema(format!(
                                "foreign key column count mismatch: {}.{}",
                                db_schema.name, table.name
                            )));
                        }

                        let ref_columns =
                            lookup(&catalog, &fk.referenced_schema, &fk.referenced_table)
                                .ok_or_else(|| {
                                    Error::InvalidSchema(format!(
                                        "referenced table not found: {}.{}",
                                        fk.referenced_schema, fk.referenced_table
                                    ))
                                })?;

                        for column in &fk.referenced_columns {
                            if !ref_columns.contains(&column.to_lowercase()) {
                                return Err(Error::InvalidSchema(format!(
                                    "referenced column not found: {}.{}.{}",
                                    fk.referenced_schema, fk.referenced_table, column
                                )));
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn build_catalog(schema: &DatabaseSchema) -> Result<Catalog> {
    let mut catalog = Catalog::new();

    for db_schema in &schema.schemas {
        let schema_key = db_schema.name.to_lowercase();
        if catalog.contains_key(&schema_key) {
            return Err(Error::InvalidSchema(format!(
                "duplicate schema name: {}",
                db_schema.name
            )));
        }

        let mut tables = BTreeMap::new();
        for table in &db_schema.tables {
            let table_key = table.name.to_lowercase();
            if tables.contains_key(&table_key) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate table name: {}.{}",
                    db_schema.name, table.name
                )));
            }

            let mut columns = BTreeSet::new();
            let mut property_uris = BTreeSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.to_lowercase()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate column name: {}.{}.{}",
                        db_schema.name, table.name, column.name
                    )));
                }
                if let Some(uri) = &column.property_uri {
                    if !property_uris.insert(uri.to_lowercase()) {
                        return Err(Error::InvalidSchema(format!(
                            "duplicate property identifier: {}.{} ({uri})",
                            db_schema.name, table.name
                        )));
                    }
                }
            }

            tables.insert(table_key, columns);
        }

        catalog.insert(schema_key, tables);
    }

    Ok(catalog)
}

fn lookup<'a>(catalog: &'a Catalog, schema: &str, table: &str) -> Option<&'a BTreeSet<String>> {
    catalog
        .get(&schema.to_lowercase())
        .and_then(|tables| tables.get(&table.to_lowercase()))
}
