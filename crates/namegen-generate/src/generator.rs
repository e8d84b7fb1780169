use std::sync::Arc;

use chrono::NaiveDateTime;
use namegen_core::{Row, SchemaResolver, Value};
use namegen_expr::ParsedExpression;
use namegen_sequence::{PreallocatingSequence, SampleCounters, SequenceManager};
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisResult, analyze};
use crate::errors::{NameGenError, Result};
use crate::lineage::Parents;
use crate::lookup::LookupResolver;
use crate::state::GenerationState;

/// Row key that carries an explicit name and receives generated ones.
pub const NAME_KEY: &str = "name";
pub const DEFAULT_COUNTER_PREFIX: &str = "NameGenCounter-";
const DEFAULT_COUNTER_SCOPE: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateOptions {
    /// Suffix repeated names with `.N` instead of failing.
    pub add_unique_suffix: bool,
    /// Advance the sample counters once per row.
    pub increment_counters: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Drop rows whose name repeats an earlier one instead of failing.
    pub skip_duplicates: bool,
    pub add_unique_suffix: bool,
    pub increment_counters: bool,
}

/// Compiled name expression bound to the collaborators it draws from.
pub struct NameGenerator {
    expression: ParsedExpression,
    analysis: AnalysisResult,
    pub(crate) schema: Option<Arc<dyn SchemaResolver>>,
    pub(crate) lookup: Option<Arc<dyn LookupResolver>>,
    pub(crate) sample_counters: Option<SampleCounters>,
    pub(crate) sequences: Option<Arc<SequenceManager>>,
    pub(crate) counter_scope: String,
    pub(crate) counter_prefix: String,
    pub(crate) gen_id: Option<Arc<PreallocatingSequence>>,
    pub(crate) seed: Option<u64>,
    pub(crate) reference_time: Option<NaiveDateTime>,
}

impl std::fmt::Debug for NameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameGenerator")
            .field("expression", &self.expression.source())
            .field("analysis", &self.analysis)
            .field("counter_scope", &self.counter_scope)
            .finish_non_exhaustive()
    }
}

impl NameGenerator {
    /// Generator with no schema, lookups or counters.
    pub fn new(expression: &str) -> Result<Self> {
        Self::builder(expression).build()
    }

    pub fn builder(expression: impl Into<String>) -> NameGeneratorBuilder {
        NameGeneratorBuilder::new(expression)
    }

    pub fn expression(&self) -> &ParsedExpression {
        &self.expression
    }

    pub fn analysis(&self) -> &AnalysisResult {
        &self.analysis
    }

    /// Open a batch. The state must be closed, or dropped, once the batch ends.
    pub fn create_state(&self, options: StateOptions) -> Result<GenerationState<'_>> {
        GenerationState::open(self, options)
    }

    /// Name a single row in a throwaway state.
    pub fn generate_name(&self, row: &Row) -> Result<String> {
        self.generate_name_with(row, &Parents::default(), false)
    }

    pub fn generate_name_with(
        &self,
        row: &Row,
        parents: &Parents,
        increment_counters: bool,
    ) -> Result<String> {
        let mut state = self.create_state(StateOptions {
            add_unique_suffix: false,
            increment_counters,
        })?;
        let name = state.next_name(row, parents);
        let closed = state.close();
        let name = name?;
        closed?;
        Ok(name)
    }

    /// Name a row within an open batch.
    pub fn generate_name_in(&self, state: &mut GenerationState<'_>, row: &Row) -> Result<String> {
        state.next_name(row, &Parents::default())
    }

    /// Write a name into the `name` field of every row.
    ///
    /// With `skip_duplicates`, rows whose name repeats are removed and the
    /// rest keep their order; any other failure aborts the batch.
    pub fn generate_names(
        &self,
        rows: &mut Vec<Row>,
        parents: &Parents,
        options: BatchOptions,
    ) -> Result<()> {
        let mut state = self.create_state(StateOptions {
            add_unique_suffix: options.add_unique_suffix,
            increment_counters: options.increment_counters,
        })?;

        let mut keep = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in rows.iter_mut() {
            match state.next_name(row, parents) {
                Ok(name) => {
                    row.insert(NAME_KEY, Value::Text(name));
                    keep.push(true);
                }
                Err(err) if options.skip_duplicates && err.is_duplicate() => {
                    debug!(error = %err, "skipping duplicate row");
                    skipped += 1;
                    keep.push(false);
                }
                Err(err) => {
                    if let Err(close_err) = state.close() {
                        warn!(error = %close_err, "failed to close generation state");
                    }
                    return Err(err);
                }
            }
        }
        state.close()?;

        let mut flags = keep.into_iter();
        rows.retain(|_| flags.next().unwrap_or(true));
        info!(named = rows.len(), skipped, "batch named");
        Ok(())
    }
}

/// Configures the collaborators of a [`NameGenerator`].
pub struct NameGeneratorBuilder {
    expression: String,
    schema: Option<Arc<dyn SchemaResolver>>,
    lookup: Option<Arc<dyn LookupResolver>>,
    sample_counters: Option<SampleCounters>,
    sequences: Option<Arc<SequenceManager>>,
    counter_scope: String,
    counter_prefix: String,
    gen_id: Option<Arc<PreallocatingSequence>>,
    seed: Option<u64>,
    reference_time: Option<NaiveDateTime>,
}

impl NameGeneratorBuilder {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            schema: None,
            lookup: None,
            sample_counters: None,
            sequences: None,
            counter_scope: DEFAULT_COUNTER_SCOPE.to_string(),
            counter_prefix: DEFAULT_COUNTER_PREFIX.to_string(),
            gen_id: None,
            seed: None,
            reference_time: None,
        }
    }

    pub fn schema(mut self, schema: Arc<dyn SchemaResolver>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn lookup_resolver(mut self, lookup: Arc<dyn LookupResolver>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn sample_counters(mut self, counters: SampleCounters) -> Self {
        self.sample_counters = Some(counters);
        self
    }

    /// Sequences backing `withCounter` parts.
    pub fn sequences(mut self, manager: Arc<SequenceManager>) -> Self {
        self.sequences = Some(manager);
        self
    }

    pub fn counter_scope(mut self, scope: impl Into<String>) -> Self {
        self.counter_scope = scope.into();
        self
    }

    pub fn counter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.counter_prefix = prefix.into();
        self
    }

    pub fn gen_id(mut self, sequence: Arc<PreallocatingSequence>) -> Self {
        self.gen_id = Some(sequence);
        self
    }

    /// Seed for the random ids exposed to expressions.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fixed `Now` and counter date instead of the wall clock.
    pub fn reference_time(mut self, now: NaiveDateTime) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn build(self) -> Result<NameGenerator> {
        let expression = namegen_expr::parse(&self.expression)?;
        let analysis = analyze(&expression, self.schema.as_deref())?;

        if analysis.has_bound_counter && self.sample_counters.is_none() {
            return Err(NameGenError::UnsupportedExpression(
                "date-bound sample counters need a counter store".to_string(),
            ));
        }
        if analysis.has_with_counter && self.sequences.is_none() {
            return Err(NameGenError::UnsupportedExpression(
                "withCounter needs a sequence store".to_string(),
            ));
        }
        if !analysis.project_counters.is_empty() && self.sample_counters.is_none() {
            warn!(
                expression = %expression,
                "project counter tokens present without a counter store; they will render blank"
            );
        }
        if !analysis.lookup_bindings.is_empty() && self.lookup.is_none() {
            warn!(
                expression = %expression,
                "lookup tokens present without a lookup resolver; they will render blank"
            );
        }

        info!(
            expression = %expression,
            lookups = analysis.lookup_bindings.len(),
            lineage = analysis.has_lineage_tokens,
            with_counter = analysis.has_with_counter,
            "name generator ready"
        );

        Ok(NameGenerator {
            expression,
            analysis,
            schema: self.schema,
            lookup: self.lookup,
            sample_counters: self.sample_counters,
            sequences: self.sequences,
            counter_scope: self.counter_scope,
            counter_prefix: self.counter_prefix,
            gen_id: self.gen_id,
            seed: self.seed,
            reference_time: self.reference_time,
        })
    }
}
