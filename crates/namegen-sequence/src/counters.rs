use std::sync::Arc;

use chrono::NaiveDate;
use namegen_core::CounterPeriod;
use serde::Serialize;

use crate::errors::SequenceResult;
use crate::key::SequenceKey;
use crate::manager::SequenceManager;

/// One draw from each sample counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleCounts {
    pub daily: i64,
    pub weekly: i64,
    pub monthly: i64,
    pub yearly: i64,
}

impl SampleCounts {
    pub fn get(&self, period: CounterPeriod) -> i64 {
        match period {
            CounterPeriod::Daily => self.daily,
            CounterPeriod::Weekly => self.weekly,
            CounterPeriod::Monthly => self.monthly,
            CounterPeriod::Yearly => self.yearly,
        }
    }
}

/// Running counts across a whole scope, independent of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectCounter {
    SampleCount,
    RootSampleCount,
}

impl ProjectCounter {
    pub const ALL: [ProjectCounter; 2] = [
        ProjectCounter::SampleCount,
        ProjectCounter::RootSampleCount,
    ];

    pub fn token_name(self) -> &'static str {
        match self {
            ProjectCounter::SampleCount => "sampleCount",
            ProjectCounter::RootSampleCount => "rootSampleCount",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|counter| counter.token_name().eq_ignore_ascii_case(name))
    }

    fn sequence_name(self) -> &'static str {
        match self {
            ProjectCounter::SampleCount => "sample:count",
            ProjectCounter::RootSampleCount => "sample:rootCount",
        }
    }
}

/// Sample counters within one scope: daily, weekly, monthly and yearly
/// buckets plus the project-wide counts.
///
/// Counters are drawn unbuffered so counts stay gap-free across processes.
#[derive(Debug, Clone)]
pub struct SampleCounters {
    manager: Arc<SequenceManager>,
    scope: String,
}

impl SampleCounters {
    pub fn new(manager: Arc<SequenceManager>, scope: impl Into<String>) -> Self {
        Self {
            manager,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Key of the counter for `period` containing `date`,
    /// e.g. `sample:weekly:2024-W01`.
    pub fn key(&self, period: CounterPeriod, date: NaiveDate) -> SequenceKey {
        SequenceKey::new(
            self.scope.clone(),
            format!("sample:{}:{}", period.label(), period.bucket(date)),
        )
    }

    pub fn increment_period(&self, period: CounterPeriod, date: NaiveDate) -> SequenceResult<i64> {
        self.manager.get_unbuffered(&self.key(period, date))?.next()
    }

    /// Advance all four counters for `date`.
    pub fn increment(&self, date: NaiveDate) -> SequenceResult<SampleCounts> {
        Ok(SampleCounts {
            daily: self.increment_period(CounterPeriod::Daily, date)?,
            weekly: self.increment_period(CounterPeriod::Weekly, date)?,
            monthly: self.increment_period(CounterPeriod::Monthly, date)?,
            yearly: self.increment_period(CounterPeriod::Yearly, date)?,
        })
    }

    pub fn current(&self, period: CounterPeriod, date: NaiveDate) -> SequenceResult<i64> {
        self.manager.store().current(&self.key(period, date))
    }

    pub fn project_key(&self, counter: ProjectCounter) -> SequenceKey {
        SequenceKey::new(self.scope.clone(), counter.sequence_name())
    }

    pub fn increment_project(&self, counter: ProjectCounter) -> SequenceResult<i64> {
        self.manager.get_unbuffered(&self.project_key(counter))?.next()
    }

    /// Make the next draw of `counter` exceed `floor`.
    pub fn ensure_project_minimum(
        &self,
        counter: ProjectCounter,
        floor: i64,
    ) -> SequenceResult<()> {
        self.manager
            .get_unbuffered(&self.project_key(counter))?
            .ensure_minimum(floor)
    }

    pub fn current_project(&self, counter: ProjectCounter) -> SequenceResult<i64> {
        self.manager.store().current(&self.project_key(counter))
    }
}
