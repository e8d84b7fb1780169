use std::collections::{BTreeMap, HashMap};

use chrono::{Local, NaiveDateTime};
use namegen_core::{CaseInsensitiveMap, CounterPeriod, Row, Value};
use namegen_sequence::{ProjectCounter, SampleCounters, SampleCounts};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::analysis::GEN_ID;
use crate::context::{CounterHandles, RowContext};
use crate::errors::{NameGenError, Result};
use crate::generator::{NAME_KEY, NameGenerator, StateOptions};
use crate::lineage::{Lineage, Parents};

type LookupCacheKey = (String, String, String);

/// Counter values drawn for one row before its name is evaluated.
#[derive(Debug, Default)]
struct RowDraws {
    counts: Option<SampleCounts>,
    project: Vec<(ProjectCounter, i64)>,
    gen_id: Option<i64>,
}

/// One batch of name generation.
///
/// Names issued within the batch are unique, ignoring case. Closing the
/// state hands unused counter values back to the store; dropping an open
/// state closes it.
pub struct GenerationState<'g> {
    generator: &'g NameGenerator,
    options: StateOptions,
    batch_random_id: String,
    now: NaiveDateTime,
    row_number: usize,
    closed: bool,
    names: CaseInsensitiveMap<usize>,
    lookup_cache: HashMap<LookupCacheKey, Option<Value>>,
    counters: CounterHandles,
    project_counters: Vec<ProjectCounter>,
    rng: ChaCha8Rng,
}

impl<'g> GenerationState<'g> {
    pub(crate) fn open(generator: &'g NameGenerator, options: StateOptions) -> Result<Self> {
        if let (Some(sequence), Some(min)) = (&generator.gen_id, generator.analysis().gen_id_min) {
            sequence.ensure_minimum(min - 1)?;
        }
        let project_counters = match &generator.sample_counters {
            Some(counters) if options.increment_counters => {
                open_project_counters(counters, &generator.analysis().project_counters)?
            }
            _ => Vec::new(),
        };

        let mut rng = ChaCha8Rng::seed_from_u64(generator.seed.unwrap_or_else(rand::random));
        let batch_random_id = random_id(&mut rng);
        let now = generator
            .reference_time
            .unwrap_or_else(|| Local::now().naive_local());
        debug!(
            batch = %batch_random_id,
            ?options,
            ?project_counters,
            "generation state opened"
        );

        Ok(Self {
            generator,
            options,
            batch_random_id,
            now,
            row_number: 0,
            closed: false,
            names: CaseInsensitiveMap::new(),
            lookup_cache: HashMap::new(),
            counters: CounterHandles::default(),
            project_counters,
            rng,
        })
    }

    pub fn options(&self) -> StateOptions {
        self.options
    }

    /// Rows seen so far, or `None` once closed.
    pub fn row_number(&self) -> Option<usize> {
        (!self.closed).then_some(self.row_number)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn batch_random_id(&self) -> &str {
        &self.batch_random_id
    }

    /// Name the next row of the batch.
    ///
    /// A non-blank `name` field wins over the expression and is returned
    /// verbatim. Counters and the genId sequence advance either way.
    pub fn next_name(&mut self, row: &Row, parents: &Parents) -> Result<String> {
        if self.closed {
            return Err(NameGenError::Closed);
        }
        self.row_number += 1;
        let row_number = self.row_number;
        let generator = self.generator;

        let draws = self
            .draw()
            .map_err(|err| NameGenError::row(row_number, err.to_string()))?;

        if let Some(explicit) = row.get(NAME_KEY).filter(|value| !value.is_blank()) {
            return self.register(explicit.to_string(), false);
        }

        let values = self.context(row, parents, draws)?;
        let mut context = RowContext::new(values, generator, &mut self.counters);
        let name = generator
            .expression()
            .eval(&mut context)
            .map_err(|err| NameGenError::row(row_number, err.to_string()))?;
        if name.is_empty() {
            debug!(expression = %generator.expression(), row_number, "empty name");
            return Err(NameGenError::row(row_number, "cannot create name"));
        }
        self.register(name, self.options.add_unique_suffix)
    }

    /// Finish the batch. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.counters.sync()?;
        if let Some(sequence) = &self.generator.gen_id {
            sequence.sync()?;
        }
        info!(
            batch = %self.batch_random_id,
            rows = self.row_number,
            names = self.names.len(),
            "generation state closed"
        );
        Ok(())
    }

    fn draw(&self) -> namegen_sequence::SequenceResult<RowDraws> {
        let generator = self.generator;
        let mut draws = RowDraws::default();
        if let Some(counters) = &generator.sample_counters {
            if self.options.increment_counters && !generator.analysis().has_bound_counter {
                draws.counts = Some(counters.increment(self.now.date())?);
            }
            for counter in &self.project_counters {
                draws
                    .project
                    .push((*counter, counters.increment_project(*counter)?));
            }
        }
        if let Some(sequence) = &generator.gen_id {
            draws.gen_id = Some(sequence.next()?);
        }
        Ok(draws)
    }

    fn register(&mut self, name: String, allow_suffix: bool) -> Result<String> {
        match self.names.get_mut(&name) {
            None => {
                self.names.insert(name.clone(), 1);
                Ok(name)
            }
            Some(count) if allow_suffix => {
                let suffixed = format!("{name}.{count}");
                *count += 1;
                Ok(suffixed)
            }
            Some(_) => Err(NameGenError::DuplicateName {
                name,
                row_number: self.row_number,
            }),
        }
    }

    fn context(
        &mut self,
        row: &Row,
        parents: &Parents,
        draws: RowDraws,
    ) -> Result<CaseInsensitiveMap<Value>> {
        let row_number = self.row_number;
        let mut values = CaseInsensitiveMap::new();
        values.insert("BatchRandomId", Value::text(&self.batch_random_id));
        values.insert("Now", Value::Timestamp(self.now));
        values.insert("_rowNumber", Value::Int(row_number as i64));
        values.insert("RandomId", Value::Text(random_id(&mut self.rng)));
        if let Some(counts) = draws.counts {
            for period in CounterPeriod::ALL {
                values.insert(period.token_name(), Value::Int(counts.get(period)));
            }
        }
        for (counter, value) in draws.project {
            values.insert(counter.token_name(), Value::Int(value));
        }
        if let Some(gen_id) = draws.gen_id {
            values.insert(GEN_ID, Value::Int(gen_id));
        }
        values.extend_from(row);

        if let Some(schema) = &self.generator.schema {
            for column in schema.columns() {
                let Some(value) = column.property_uri.as_deref().and_then(|uri| row.get(uri)) else {
                    continue;
                };
                if values.get(&column.name).is_none_or(Value::is_null) {
                    values.insert(column.name, value.clone());
                }
            }
        }

        if self.generator.analysis().has_lineage_tokens {
            Lineage::collect(parents, row)
                .map_err(|err| NameGenError::row(row_number, format!("invalid parent list: {err}")))?
                .merge_into(&mut values);
        }

        self.resolve_lookups(&mut values)?;
        Ok(values)
    }

    /// Replace lookup tokens with the referenced row's field, memoized per batch.
    fn resolve_lookups(&mut self, values: &mut CaseInsensitiveMap<Value>) -> Result<()> {
        let row_number = self.row_number;
        let generator = self.generator;
        for binding in &generator.analysis().lookup_bindings {
            let Some(root) = values.get(&binding.root).filter(|value| !value.is_blank()) else {
                continue;
            };
            let key = root
                .coerce_to(&binding.target.pk_type)
                .map_err(|err| NameGenError::row(row_number, err.to_string()))?;
            let cache_key = (
                binding.root.to_lowercase(),
                key.to_string(),
                binding.token.to_lowercase(),
            );

            let found = match self.lookup_cache.get(&cache_key) {
                Some(cached) => cached.clone(),
                None => {
                    let found = match &generator.lookup {
                        Some(lookup) => lookup
                            .resolve(&binding.target, &key, &binding.field)
                            .map_err(|err| NameGenError::row(row_number, err.to_string()))?,
                        None => None,
                    };
                    self.lookup_cache.insert(cache_key, found.clone());
                    found
                }
            };
            values.insert(binding.token.clone(), found.unwrap_or_default());
        }
        Ok(())
    }
}

impl Drop for GenerationState<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close generation state");
        }
    }
}

/// Project counters to draw for every row: those the expression names,
/// raised to their `minValue` floors, and those already in use.
fn open_project_counters(
    counters: &SampleCounters,
    referenced: &BTreeMap<ProjectCounter, i64>,
) -> namegen_sequence::SequenceResult<Vec<ProjectCounter>> {
    let mut active = Vec::new();
    for counter in ProjectCounter::ALL {
        match referenced.get(&counter) {
            Some(min) => {
                counters.ensure_project_minimum(counter, min - 1)?;
                active.push(counter);
            }
            None if counters.current_project(counter)? > 0 => active.push(counter),
            None => {}
        }
    }
    Ok(active)
}

fn random_id(rng: &mut ChaCha8Rng) -> String {
    format!("{:04}", rng.random_range(0..10_000u32))
}
