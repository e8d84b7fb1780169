use std::collections::HashMap;
use std::sync::Mutex;

use super::{SequenceStore, check_count, checked_add, released_value};
use crate::errors::{SequenceError, SequenceResult};
use crate::key::SequenceKey;

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    value: i64,
    floor: i64,
}

/// Process-local store; values are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    values: Mutex<HashMap<SequenceKey, Counter>>,
}

impl MemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(
        &self,
        f: impl FnOnce(&mut HashMap<SequenceKey, Counter>) -> SequenceResult<T>,
    ) -> SequenceResult<T> {
        let mut values = self.values.lock().map_err(|_| SequenceError::Poisoned)?;
        f(&mut values)
    }
}

impl SequenceStore for MemorySequenceStore {
    fn reserve(&self, key: &SequenceKey, count: i64) -> SequenceResult<i64> {
        check_count(count)?;
        self.with_values(|values| {
            let counter = values.entry(key.clone()).or_default();
            let end = checked_add(key, counter.value, count)?;
            counter.value = end;
            Ok(end - count + 1)
        })
    }

    fn ensure_minimum(&self, key: &SequenceKey, floor: i64) -> SequenceResult<i64> {
        self.with_values(|values| {
            let counter = values.entry(key.clone()).or_default();
            counter.floor = counter.floor.max(floor);
            counter.value = counter.value.max(floor);
            Ok(counter.value)
        })
    }

    fn current(&self, key: &SequenceKey) -> SequenceResult<i64> {
        self.with_values(|values| Ok(values.get(key).map_or(0, |counter| counter.value)))
    }

    fn release(
        &self,
        key: &SequenceKey,
        reserved_end: i64,
        last_used: i64,
    ) -> SequenceResult<bool> {
        self.with_values(|values| {
            let Some(counter) = values.get_mut(key) else {
                return Ok(false);
            };
            match released_value(counter.value, counter.floor, reserved_end, last_used) {
                Some(lowered) => {
                    counter.value = lowered;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySequenceStore;
    use crate::key::SequenceKey;
    use crate::store::SequenceStore;

    #[test]
    fn reserves_consecutive_ranges() {
        let store = MemorySequenceStore::new();
        let key = SequenceKey::new("project", "sample:genId");
        assert_eq!(store.reserve(&key, 10).expect("first"), 1);
        assert_eq!(store.reserve(&key, 10).expect("second"), 11);
        assert_eq!(store.current(&key).expect("current"), 20);
        assert!(store.reserve(&key, 0).is_err());
    }

    #[test]
    fn ensure_minimum_never_lowers() {
        let store = MemorySequenceStore::new();
        let key = SequenceKey::new("project", "data:genId");
        assert_eq!(store.ensure_minimum(&key, 50).expect("raise"), 50);
        assert_eq!(store.ensure_minimum(&key, 10).expect("keep"), 50);
        assert_eq!(store.reserve(&key, 1).expect("next"), 51);
    }

    #[test]
    fn release_keeps_ensured_floor() {
        let store = MemorySequenceStore::new();
        let key = SequenceKey::new("project", "counter");
        store.reserve(&key, 100).expect("block");
        assert_eq!(store.ensure_minimum(&key, 50).expect("floor"), 100);
        assert!(store.release(&key, 100, 1).expect("release"));
        assert_eq!(store.current(&key).expect("current"), 50);
        assert_eq!(store.reserve(&key, 1).expect("next"), 51);
    }

    #[test]
    fn release_only_when_nobody_reserved_after() {
        let store = MemorySequenceStore::new();
        let key = SequenceKey::new("project", "counter");
        store.reserve(&key, 100).expect("block");
        assert!(store.release(&key, 100, 3).expect("release"));
        assert_eq!(store.current(&key).expect("current"), 3);

        store.reserve(&key, 100).expect("block a");
        store.reserve(&key, 100).expect("block b");
        assert!(!store.release(&key, 103, 4).expect("stale release"));
        assert_eq!(store.current(&key).expect("current"), 203);
    }
}
