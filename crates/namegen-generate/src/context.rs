use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use namegen_core::{CaseInsensitiveMap, CounterPeriod, Value};
use namegen_expr::{CounterPart, EvalContext, EvalError, Token};
use namegen_sequence::{PreallocatingSequence, SequenceError, SequenceKey, SequenceResult};

use crate::generator::NameGenerator;

/// `withCounter` sequences touched by one generation state.
#[derive(Debug, Default)]
pub(crate) struct CounterHandles {
    handles: HashMap<SequenceKey, Arc<PreallocatingSequence>>,
}

impl CounterHandles {
    /// Next value of the counter named after `prefix`.
    ///
    /// A configured start raises the floor the first time the counter is
    /// used in this state.
    fn next(
        &mut self,
        generator: &NameGenerator,
        counter: &CounterPart,
        prefix: &str,
    ) -> SequenceResult<i64> {
        let key = SequenceKey::new(
            generator.counter_scope.clone(),
            format!("{}{}", generator.counter_prefix, prefix.trim().to_lowercase()),
        );
        if let Some(handle) = self.handles.get(&key) {
            return handle.next();
        }

        let manager = generator
            .sequences
            .as_ref()
            .ok_or_else(|| SequenceError::Invalid("no sequence store configured".to_string()))?;
        let handle = if counter.no_gap() {
            manager.get_unbuffered(&key)?
        } else {
            manager.get(&key)?
        };
        if let Some(start) = counter.start() {
            handle.ensure_minimum(start - 1)?;
        }
        self.handles.insert(key, Arc::clone(&handle));
        handle.next()
    }

    pub(crate) fn sync(&self) -> SequenceResult<()> {
        let mut first_error = None;
        for handle in self.handles.values() {
            if let Err(err) = handle.sync() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Substitution context for one row, drawing counters on demand.
pub(crate) struct RowContext<'a> {
    values: CaseInsensitiveMap<Value>,
    generator: &'a NameGenerator,
    counters: &'a mut CounterHandles,
}

impl<'a> RowContext<'a> {
    pub(crate) fn new(
        values: CaseInsensitiveMap<Value>,
        generator: &'a NameGenerator,
        counters: &'a mut CounterHandles,
    ) -> Self {
        Self {
            values,
            generator,
            counters,
        }
    }
}

impl EvalContext for RowContext<'_> {
    fn value(&self, token: &Token) -> Option<Value> {
        self.values.get(&token.key()).cloned()
    }

    fn sample_count(&mut self, period: CounterPeriod, date: NaiveDate) -> Result<i64, EvalError> {
        let counters = self
            .generator
            .sample_counters
            .as_ref()
            .ok_or_else(|| EvalError::Counter("no sample counters configured".to_string()))?;
        counters
            .increment_period(period, date)
            .map_err(|err| EvalError::Counter(err.to_string()))
    }

    fn counter_value(&mut self, counter: &CounterPart, prefix: &str) -> Result<i64, EvalError> {
        self.counters
            .next(self.generator, counter, prefix)
            .map_err(|err| EvalError::Counter(err.to_string()))
    }
}
