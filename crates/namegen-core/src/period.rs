use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Time bucket of a sample counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl CounterPeriod {
    pub const ALL: [CounterPeriod; 4] = [
        CounterPeriod::Daily,
        CounterPeriod::Weekly,
        CounterPeriod::Monthly,
        CounterPeriod::Yearly,
    ];

    /// Token or format name, e.g. `dailySampleCount`.
    pub fn token_name(self) -> &'static str {
        match self {
            CounterPeriod::Daily => "dailySampleCount",
            CounterPeriod::Weekly => "weeklySampleCount",
            CounterPeriod::Monthly => "monthlySampleCount",
            CounterPeriod::Yearly => "yearlySampleCount",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|period| period.token_name().eq_ignore_ascii_case(name))
    }

    pub fn label(self) -> &'static str {
        match self {
            CounterPeriod::Daily => "daily",
            CounterPeriod::Weekly => "weekly",
            CounterPeriod::Monthly => "monthly",
            CounterPeriod::Yearly => "yearly",
        }
    }

    /// Bucket containing `date`. Weeks use the ISO week-based year.
    pub fn bucket(self, date: NaiveDate) -> String {
        match self {
            CounterPeriod::Daily => date.format("%Y-%m-%d").to_string(),
            CounterPeriod::Weekly => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            CounterPeriod::Monthly => format!("{}-{:02}", date.year(), date.month()),
            CounterPeriod::Yearly => date.year().to_string(),
        }
    }
}
