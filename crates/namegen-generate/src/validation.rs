use chrono::{NaiveDate, NaiveDateTime};
use namegen_core::{CaseInsensitiveMap, ColumnType, CounterPeriod, SchemaResolver, TypeKind, Value};
use namegen_expr::{CounterPart, EvalContext, EvalError, ParsedExpression, Part, Token};
use namegen_sequence::ProjectCounter;
use serde::Serialize;
use tracing::debug;

use crate::analysis::{AnalysisResult, GEN_ID, analyze};
use crate::lineage::{DATA_INPUTS, INPUTS, MATERIAL_INPUTS, is_lineage_root};

const PREVIEW_RANDOM_ID: i64 = 3294;
const PREVIEW_GEN_ID: i64 = 1001;

/// Findings for one expression, checked before any row is named.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Name rendered from placeholder values; absent when there are errors.
    pub preview: Option<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check `expression` against the owning table and render a preview name.
///
/// Errors cover syntax, unsupported paths and fields the table lacks.
/// Warnings flag reserved words or field names written outside `${}`, and
/// a preview that cannot be rendered.
pub fn validate_expression(
    expression: &str,
    schema: Option<&dyn SchemaResolver>,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let parsed = match namegen_expr::parse(expression) {
        Ok(parsed) => parsed,
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };
    let analysis = match analyze(&parsed, schema) {
        Ok(analysis) => analysis,
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };

    let mut preview = PreviewContext::default();
    for token in parsed.tokens() {
        check_token(token, &analysis, schema, &mut report, &mut preview);
    }
    report.warnings.extend(unbraced_words(&parsed, schema));

    if report.errors.is_empty() {
        match parsed.eval(&mut preview) {
            Ok(name) if !name.is_empty() => report.preview = Some(name),
            Ok(_) => report
                .warnings
                .push("expression renders an empty name for the preview values".to_string()),
            Err(err) => report.warnings.push(format!("preview unavailable: {err}")),
        }
    }

    debug!(
        expression = %parsed,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "expression validated"
    );
    report
}

fn check_token(
    token: &Token,
    analysis: &AnalysisResult,
    schema: Option<&dyn SchemaResolver>,
    report: &mut ValidationReport,
    preview: &mut PreviewContext,
) {
    let key = token.key();
    if is_lineage_root(token.root()) {
        preview.values.insert(key, Value::text(lineage_preview(token.root())));
        return;
    }

    if token.path().len() == 1 {
        if let Some(value) = reserved_preview(token.root()) {
            preview.values.insert(key, value);
            return;
        }
        match schema.map(|schema| schema.resolve_column(token.root())) {
            Some(Some(column)) => {
                let value = column_preview(&column.name, &column.column_type);
                preview.values.insert(key, value);
            }
            Some(None) => report
                .errors
                .push(format!("invalid substitution token: ${{{}}}", token.source())),
            None => {
                let value = Value::text(format!("{}Value", token.root()));
                preview.values.insert(key, value);
            }
        }
        return;
    }

    if let Some(binding) = analysis.binding(&key) {
        preview
            .values
            .insert(key, Value::text(format!("{}Value", binding.field)));
        return;
    }
    let Some(schema) = schema else {
        return;
    };
    match schema.resolve_column(token.root()) {
        Some(column) if column.is_lookup => report.errors.push(format!(
            "lookup field not supported on table with multiple primary key fields: {}",
            token.root()
        )),
        _ => report
            .errors
            .push(format!("lookup field does not exist: {key}")),
    }
}

fn lineage_preview(root: &str) -> &'static str {
    if root.eq_ignore_ascii_case(DATA_INPUTS) {
        "Data101"
    } else if root.eq_ignore_ascii_case(MATERIAL_INPUTS) {
        "Sample101"
    } else {
        "Parent101"
    }
}

fn reserved_preview(name: &str) -> Option<Value> {
    if let Some(period) = CounterPeriod::from_token_name(name) {
        let count = match period {
            CounterPeriod::Daily => 14,
            CounterPeriod::Weekly => 25,
            CounterPeriod::Monthly => 150,
            CounterPeriod::Yearly => 412,
        };
        return Some(Value::Int(count));
    }
    if let Some(counter) = ProjectCounter::from_token_name(name) {
        let count = match counter {
            ProjectCounter::SampleCount => 240,
            ProjectCounter::RootSampleCount => 124,
        };
        return Some(Value::Int(count));
    }

    let lowered = name.to_ascii_lowercase();
    match lowered.as_str() {
        "batchrandomid" | "randomid" => Some(Value::Int(PREVIEW_RANDOM_ID)),
        "now" => Some(preview_timestamp().map_or(Value::Null, Value::Timestamp)),
        "_rownumber" => Some(Value::Int(1)),
        _ if name.eq_ignore_ascii_case(GEN_ID) => Some(Value::Int(PREVIEW_GEN_ID)),
        _ => None,
    }
}

fn preview_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2021, 4, 28)
}

fn preview_timestamp() -> Option<NaiveDateTime> {
    preview_date().and_then(|date| date.and_hms_opt(8, 30, 0))
}

fn column_preview(name: &str, column_type: &ColumnType) -> Value {
    match column_type.kind() {
        TypeKind::Integer => Value::Int(3),
        TypeKind::Numeric => Value::Float(1.5),
        TypeKind::Boolean => Value::Bool(true),
        TypeKind::Date => preview_date().map_or(Value::Null, Value::Date),
        TypeKind::Timestamp => preview_timestamp().map_or(Value::Null, Value::Timestamp),
        TypeKind::Text => Value::text(format!("{name}Value")),
    }
}

/// Reserved words and table fields that appear in literal text, where they
/// are kept verbatim instead of substituted.
fn unbraced_words(parsed: &ParsedExpression, schema: Option<&dyn SchemaResolver>) -> Vec<String> {
    let literals: Vec<&str> = parsed
        .deep_parts()
        .into_iter()
        .filter_map(|part| match part {
            Part::Constant(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    if literals.is_empty() {
        return Vec::new();
    }

    let mut words: Vec<String> = ["BatchRandomId", "RandomId", "Now", GEN_ID, "withCounter"]
        .into_iter()
        .chain(CounterPeriod::ALL.map(CounterPeriod::token_name))
        .chain(ProjectCounter::ALL.map(ProjectCounter::token_name))
        .chain([INPUTS, DATA_INPUTS, MATERIAL_INPUTS])
        .map(str::to_string)
        .collect();
    if let Some(schema) = schema {
        words.extend(schema.columns().into_iter().map(|column| column.name));
    }

    let mut warnings = Vec::new();
    for word in words {
        if literals.iter().any(|text| contains_word(text, &word)) {
            warnings.push(format!(
                "'{word}' appears outside ${{}} and will be kept as literal text"
            ));
        }
    }
    warnings
}

/// Case-insensitive match of `word` not joined to neighboring letters.
fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let haystack = text.to_ascii_lowercase();
    let needle = word.to_ascii_lowercase();
    haystack.match_indices(&needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
    })
}

/// Placeholder values standing in for a row and its counters.
#[derive(Debug, Default)]
struct PreviewContext {
    values: CaseInsensitiveMap<Value>,
}

impl EvalContext for PreviewContext {
    fn value(&self, token: &Token) -> Option<Value> {
        self.values.get(&token.key()).cloned()
    }

    fn sample_count(&mut self, period: CounterPeriod, _date: NaiveDate) -> Result<i64, EvalError> {
        match reserved_preview(period.token_name()) {
            Some(Value::Int(count)) => Ok(count),
            _ => Ok(1),
        }
    }

    fn counter_value(&mut self, counter: &CounterPart, _prefix: &str) -> Result<i64, EvalError> {
        Ok(counter.start().unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_uses_placeholder_values() {
        let report = validate_expression(
            "S-${genId}-${dailySampleCount}-${sampleCount}-${now:date('yyMMdd')}",
            None,
        );
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.preview.as_deref(), Some("S-1001-14-240-210428"));
    }

    #[test]
    fn syntax_errors_skip_preview() {
        let report = validate_expression("S-${genId", None);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.preview, None);

        let report = validate_expression("${a/b/c}", None);
        assert!(report.errors[0].contains("more than two segments"));
    }

    #[test]
    fn counters_preview_from_their_start() {
        let report = validate_expression("${${kind}-:withCounter(50, '000')}", None);
        assert_eq!(report.preview.as_deref(), Some("kindValue-050"));

        let report = validate_expression("${Inputs:first}_${${Inputs}.:withCounter}", None);
        assert_eq!(report.preview.as_deref(), Some("Parent101_Parent101.1"));
    }

    #[test]
    fn reserved_words_in_literal_text_warn() {
        let report = validate_expression("genId-${x}-withCounter", None);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("'genId'"));
        assert!(report.warnings[1].contains("'withCounter'"));
        assert_eq!(report.preview.as_deref(), Some("genId-xValue-withCounter"));

        assert!(!contains_word("unknown", "now"));
        assert!(contains_word("S_NOW-", "now"));
    }
}
