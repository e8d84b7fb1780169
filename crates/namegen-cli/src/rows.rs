use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use namegen_core::{Row, Value};

use crate::CliError;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Rows from a CSV file with a header line, or a JSON array of objects.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, CliError> {
    let file = File::open(path)?;
    if is_json(path) {
        read_json_rows(file)
    } else {
        read_csv_rows(file)
    }
}

pub fn read_csv_rows(input: impl Read) -> Result<Vec<Row>, CliError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::text(cell)
                };
                (header.to_string(), value)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_json_rows(input: impl Read) -> Result<Vec<Row>, CliError> {
    let document: serde_json::Value = serde_json::from_reader(input)?;
    let serde_json::Value::Array(items) = document else {
        return Err(CliError::InvalidInput(
            "expected a JSON array of row objects".to_string(),
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            serde_json::Value::Object(fields) => Ok(fields
                .iter()
                .map(|(key, value)| (key.clone(), Value::from(value)))
                .collect()),
            _ => Err(CliError::InvalidInput(format!(
                "row {} is not a JSON object",
                index + 1
            ))),
        })
        .collect()
}

/// Write rows as JSON when `out` ends in `.json`, otherwise as CSV.
/// Without `out` the rows go to stdout as CSV.
pub fn write_rows(out: Option<&Path>, rows: &[Row]) -> Result<(), CliError> {
    match out {
        Some(path) if is_json(path) => {
            let document: Vec<serde_json::Value> = rows.iter().map(row_to_json).collect();
            let mut file = File::create(path)?;
            serde_json::to_writer_pretty(&mut file, &document)?;
            file.write_all(b"\n")?;
            Ok(())
        }
        Some(path) => write_csv_rows(File::create(path)?, rows),
        None => write_csv_rows(io::stdout().lock(), rows),
    }
}

pub fn write_csv_rows(output: impl Write, rows: &[Row]) -> Result<(), CliError> {
    let mut headers: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.to_lowercase()) {
                headers.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(&headers)?;
    for row in rows {
        let record: Vec<String> = headers
            .iter()
            .map(|header| row.get(header).map(ToString::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn row_to_json(row: &Row) -> serde_json::Value {
    serde_json::Value::Object(
        row.iter()
            .map(|(key, value)| (key.to_string(), value.to_json()))
            .collect(),
    )
}
