use namegen_core::{
    Column, ColumnType, Constraint, DatabaseSchema, ForeignKey, PrimaryKey, Schema,
    SchemaResolver, Table, TableSchemaResolver, validate_schema,
};
use schemars::schema_for;

fn column(position: i16, name: &str, data_type: &str) -> Column {
    Column {
        ordinal_position: position,
        name: name.to_string(),
        property_uri: None,
        column_type: ColumnType::new(data_type),
        is_nullable: true,
    }
}

fn sample_schema() -> DatabaseSchema {
    let mut lab = column(2, "lab", "integer");
    lab.property_uri = Some("urn:lsid:example.org:Vocabulary:Samples#lab".to_string());
    DatabaseSchema {
        schema_version: "0.1".to_string(),
        schemas: vec![Schema {
            name: "samples".to_string(),
            tables: vec![
                Table {
                    name: "blood".to_string(),
                    columns: vec![
                        column(1, "name", "text"),
                        lab,
                        column(3, "site", "text"),
                    ],
                    constraints: vec![
                        Constraint::ForeignKey(ForeignKey {
                            name: Some("blood_lab_fk".to_string()),
                            columns: vec!["lab".to_string()],
                            referenced_schema: "samples".to_string(),
                            referenced_table: "labs".to_string(),
                            referenced_columns: vec!["id".to_string()],
                        }),
                        Constraint::ForeignKey(ForeignKey {
                            name: None,
                            columns: vec!["site".to_string()],
                            referenced_schema: "samples".to_string(),
                            referenced_table: "sites".to_string(),
                            referenced_columns: vec!["region".to_string()],
                        }),
                    ],
                },
                Table {
                    name: "labs".to_string(),
                    columns: vec![column(1, "id", "integer"), column(2, "code", "text")],
                    constraints: vec![Constraint::PrimaryKey(PrimaryKey {
                        name: None,
                        columns: vec!["id".to_string()],
                    })],
                },
                Table {
                    name: "sites".to_string(),
                    columns: vec![column(1, "region", "text"), column(2, "code", "text")],
                    constraints: vec![Constraint::PrimaryKey(PrimaryKey {
                        name: None,
                        columns: vec!["region".to_string(), "code".to_string()],
                    })],
                },
            ],
        }],
    }
}

#[test]
fn validates_consistent_schema() {
    validate_schema(&sample_schema()).expect("valid schema");
}

#[test]
fn rejects_duplicate_columns_ignoring_case() {
    let mut schema = sample_schema();
    schema.schemas[0].tables[0]
        .columns
        .push(column(4, "SITE", "text"));
    let err = validate_schema(&schema).expect_err("duplicate column");
    assert!(err.to_string().contains("duplicate column name"));
}

#[test]
fn rejects_missing_reference_target() {
    let mut schema = sample_schema();
    schema.schemas[0].tables.remove(1);
    let err = validate_schema(&schema).expect_err("missing labs");
    assert!(err.to_string().contains("referenced table not found"));
}

#[test]
fn resolver_binds_single_key_lookups_only() {
    let resolver = TableSchemaResolver::new(&sample_schema(), "samples", "Blood").expect("table");

    let lab = resolver.resolve_column("LAB").expect("lab column");
    assert!(lab.is_lookup);
    let target = lab.lookup_target.expect("single pk target");
    assert_eq!(target.table, "labs");
    assert_eq!(target.pk_column, "id");
    assert_eq!(target.pk_type, ColumnType::new("integer"));

    let site = resolver.resolve_column("site").expect("site column");
    assert!(site.is_lookup);
    assert!(site.lookup_target.is_none());
    assert!(site.column_type.is_string_type());

    let by_uri = resolver
        .resolve_column("urn:lsid:example.org:Vocabulary:Samples#lab")
        .expect("property uri");
    assert_eq!(by_uri.name, "lab");

    assert!(resolver.resolve_column("missing").is_none());
    assert_eq!(resolver.columns().len(), 3);
}

#[test]
fn unknown_table_is_not_found() {
    assert!(TableSchemaResolver::new(&sample_schema(), "samples", "nope").is_err());
}

#[test]
fn json_schema_describes_snapshot() {
    let generated = schema_for!(DatabaseSchema);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");
    let properties = json
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("top-level properties");
    assert!(properties.contains_key("schema_version"));
    assert!(properties.contains_key("schemas"));
}

#[test]
fn snapshot_round_trips_through_json() {
    let json = serde_json::to_string(&sample_schema()).expect("serialize");
    let parsed: DatabaseSchema = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed.schemas[0].tables.len(), 3);
    assert_eq!(
        parsed.schemas[0].tables[0].columns[1].property_uri.as_deref(),
        Some("urn:lsid:example.org:Vocabulary:Samples#lab")
    );
}
