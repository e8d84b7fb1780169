use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one durable counter.
///
/// `name` conventionally reads `<entity-kind>:<purpose>`; `sub_id`
/// distinguishes several counters of the same purpose within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceKey {
    pub scope: String,
    pub name: String,
    #[serde(default)]
    pub sub_id: i64,
}

impl SequenceKey {
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            sub_id: 0,
        }
    }

    pub fn with_sub_id(mut self, sub_id: i64) -> Self {
        self.sub_id = sub_id;
        self
    }
}

impl fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.name)?;
        if self.sub_id != 0 {
            write!(f, "#{}", self.sub_id)?;
        }
        Ok(())
    }
}
