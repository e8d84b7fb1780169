use csv::{ReaderBuilder, Trim};
use namegen_core::{CaseInsensitiveMap, Row, Value};

pub const INPUTS: &str = "Inputs";
pub const DATA_INPUTS: &str = "DataInputs";
pub const MATERIAL_INPUTS: &str = "MaterialInputs";

pub(crate) fn is_lineage_root(name: &str) -> bool {
    [INPUTS, DATA_INPUTS, MATERIAL_INPUTS]
        .iter()
        .any(|root| root.eq_ignore_ascii_case(name))
}

/// Parent names supplied by the caller alongside a row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parents {
    pub datas: Vec<String>,
    pub samples: Vec<String>,
}

impl Parents {
    pub fn new(datas: Vec<String>, samples: Vec<String>) -> Self {
        Self { datas, samples }
    }

    pub fn is_empty(&self) -> bool {
        self.datas.is_empty() && self.samples.is_empty()
    }
}

/// Split a row value into parent names.
///
/// Text and numbers are read as one comma-delimited record, honoring
/// double quotes; lists contribute one name per item. Blank entries are
/// dropped.
pub fn parent_names(value: &Value) -> Result<Vec<String>, csv::Error> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(items) => Ok(items
            .iter()
            .map(|item| item.to_string().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()),
        other => split_record(&other.to_string()),
    }
}

fn split_record(text: &str) -> Result<Vec<String>, csv::Error> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .trim(Trim::All)
        .from_reader(text.as_bytes());
    let mut names = Vec::new();
    if let Some(record) = reader.records().next() {
        for field in record?.iter() {
            if !field.is_empty() {
                names.push(field.to_string());
            }
        }
    }
    Ok(names)
}

/// Lineage sets for one row, in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct Lineage {
    sets: CaseInsensitiveMap<Vec<String>>,
}

impl Lineage {
    pub(crate) fn collect(parents: &Parents, row: &Row) -> Result<Self, csv::Error> {
        let mut lineage = Lineage::default();
        for root in [INPUTS, DATA_INPUTS, MATERIAL_INPUTS] {
            lineage.sets.insert(root, Vec::new());
        }
        for name in &parents.datas {
            lineage.add(&[INPUTS, DATA_INPUTS], name);
        }
        for name in &parents.samples {
            lineage.add(&[INPUTS, MATERIAL_INPUTS], name);
        }

        for (key, value) in row.iter() {
            let Some((prefix, parent_type)) = key.split_once('/') else {
                continue;
            };
            let category = if prefix.eq_ignore_ascii_case(DATA_INPUTS) {
                DATA_INPUTS
            } else if prefix.eq_ignore_ascii_case(MATERIAL_INPUTS) {
                MATERIAL_INPUTS
            } else {
                continue;
            };
            let inputs_key = format!("{INPUTS}/{parent_type}");
            let category_key = format!("{category}/{parent_type}");
            for name in parent_names(value)? {
                lineage.add(&[INPUTS, category, &inputs_key, &category_key], &name);
            }
        }
        Ok(lineage)
    }

    fn add(&mut self, keys: &[&str], name: &str) {
        for key in keys {
            match self.sets.get_mut(key) {
                Some(set) => {
                    if !set.iter().any(|seen| seen == name) {
                        set.push(name.to_string());
                    }
                }
                None => {
                    self.sets.insert(*key, vec![name.to_string()]);
                }
            }
        }
    }

    /// Merge into a substitution context: one name as text, none as null,
    /// several as a list.
    pub(crate) fn merge_into(self, context: &mut CaseInsensitiveMap<Value>) {
        for (key, names) in self.sets {
            let value = match names.len() {
                0 => Value::Null,
                1 => names.into_iter().next().map(Value::Text).unwrap_or_default(),
                _ => Value::List(names.into_iter().map(Value::Text).collect()),
            };
            context.insert(key, value);
        }
    }
}
