use std::collections::BTreeMap;

use namegen_core::{CounterPeriod, LookupTarget, SchemaResolver};
use namegen_expr::{Format, ParsedExpression, Token};
use namegen_sequence::ProjectCounter;
use serde::Serialize;
use tracing::debug;

use crate::errors::{NameGenError, Result};
use crate::lineage::is_lineage_root;

pub(crate) const GEN_ID: &str = "genId";

/// Static facts about an expression, computed once per generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// A sample counter appears, bare (`${dailySampleCount}`) or bound to a
    /// date field (`${when:dailySampleCount}`).
    pub has_counter_format: bool,
    /// At least one counter format is bound to a date field.
    pub has_bound_counter: bool,
    pub has_with_counter: bool,
    pub has_lineage_tokens: bool,
    pub gen_id_min: Option<i64>,
    /// Project counters referenced by the expression, each with the largest
    /// `minValue` declared for it (0 when none).
    pub project_counters: BTreeMap<ProjectCounter, i64>,
    pub lookup_bindings: Vec<LookupBinding>,
}

/// A two-segment token whose root is a lookup column of the owning table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupBinding {
    /// Context key the looked-up value is stored under (`root/field`).
    pub token: String,
    pub root: String,
    pub field: String,
    pub target: LookupTarget,
}

impl AnalysisResult {
    pub fn binding(&self, token: &str) -> Option<&LookupBinding> {
        self.lookup_bindings
            .iter()
            .find(|binding| binding.token.eq_ignore_ascii_case(token))
    }
}

/// Inspect every token of `expression`, nested counter prefixes included.
///
/// Field paths longer than two segments are rejected, as are two-segment
/// paths when no schema is available to resolve them. Paths whose root is
/// not a lookup column with a single-key target are left alone and render
/// blank.
pub fn analyze(
    expression: &ParsedExpression,
    schema: Option<&dyn SchemaResolver>,
) -> Result<AnalysisResult> {
    let mut result = AnalysisResult {
        has_with_counter: expression.counters().next().is_some(),
        ..AnalysisResult::default()
    };

    for token in expression.tokens() {
        scan_formats(token, &mut result);

        let path = token.path();
        if path.len() == 1 {
            if CounterPeriod::from_token_name(token.root()).is_some() {
                result.has_counter_format = true;
            }
            if let Some(counter) = ProjectCounter::from_token_name(token.root()) {
                result.project_counters.entry(counter).or_insert(0);
            }
            if is_lineage_root(token.root()) {
                result.has_lineage_tokens = true;
            }
            continue;
        }

        if path.len() > 2 {
            return Err(NameGenError::UnsupportedExpression(format!(
                "field path '{}' has more than two segments",
                token.key()
            )));
        }

        if is_lineage_root(token.root()) {
            result.has_lineage_tokens = true;
            continue;
        }

        let schema = schema.ok_or_else(|| {
            NameGenError::UnsupportedExpression(format!(
                "field path '{}' needs a table schema to resolve",
                token.key()
            ))
        })?;

        if let Some(binding) = lookup_binding(token, schema) {
            if result.binding(&binding.token).is_none() {
                result.lookup_bindings.push(binding);
            }
        }
    }

    debug!(
        expression = %expression,
        lookups = result.lookup_bindings.len(),
        lineage = result.has_lineage_tokens,
        with_counter = result.has_with_counter,
        "expression analyzed"
    );
    Ok(result)
}

fn scan_formats(token: &Token, result: &mut AnalysisResult) {
    for format in token.formats() {
        match format {
            Format::SampleCount(_) => {
                result.has_counter_format = true;
                result.has_bound_counter = true;
            }
            Format::MinValue(min) if is_gen_id(token) => {
                result.gen_id_min = Some(result.gen_id_min.map_or(*min, |seen| seen.max(*min)));
            }
            Format::MinValue(min) => {
                if let Some(counter) = project_counter(token) {
                    let floor = result.project_counters.entry(counter).or_insert(*min);
                    *floor = (*floor).max(*min);
                }
            }
            _ => {}
        }
    }
}

fn is_gen_id(token: &Token) -> bool {
    token.path().len() == 1 && token.root().eq_ignore_ascii_case(GEN_ID)
}

fn project_counter(token: &Token) -> Option<ProjectCounter> {
    if token.path().len() != 1 {
        return None;
    }
    ProjectCounter::from_token_name(token.root())
}

fn lookup_binding(token: &Token, schema: &dyn SchemaResolver) -> Option<LookupBinding> {
    let field = token.field()?;
    let column = schema.resolve_column(token.root())?;
    if !column.is_lookup {
        debug!(token = %token.key(), "root is not a lookup column");
        return None;
    }
    let target = column.lookup_target?;
    Some(LookupBinding {
        token: token.key(),
        root: token.root().to_string(),
        field: field.to_string(),
        target,
    })
}
