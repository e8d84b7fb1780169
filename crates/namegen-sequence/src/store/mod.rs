//! Durable counter storage.

mod file;
mod memory;
mod postgres;

pub use file::FileSequenceStore;
pub use memory::MemorySequenceStore;
pub use postgres::PgSequenceStore;

use crate::errors::{SequenceError, SequenceResult};
use crate::key::SequenceKey;

/// Atomic, durable counter storage shared by every handle on a key.
///
/// The stored value is the highest value ever reserved; a key that was never
/// touched reads as 0.
pub trait SequenceStore: Send + Sync {
    /// Atomically add `count` to the stored value and return the first value
    /// of the reserved range `[first, first + count - 1]`.
    fn reserve(&self, key: &SequenceKey, count: i64) -> SequenceResult<i64>;

    /// Raise the stored value to at least `floor`, never lowering it.
    /// The floor is kept with the value and later releases never go below it.
    /// Returns the stored value afterwards.
    fn ensure_minimum(&self, key: &SequenceKey, floor: i64) -> SequenceResult<i64>;

    fn current(&self, key: &SequenceKey) -> SequenceResult<i64>;

    /// Hand back the unused tail of a block: when the stored value still
    /// equals `reserved_end`, lower it to `last_used` clamped to the highest
    /// floor ensured so far. Returns whether the value was lowered.
    fn release(
        &self,
        key: &SequenceKey,
        reserved_end: i64,
        last_used: i64,
    ) -> SequenceResult<bool>;

    /// Human-readable location, safe to log.
    fn describe(&self) -> String;
}

/// Stored value after releasing a block tail, or `None` when it stays put.
fn released_value(value: i64, floor: i64, reserved_end: i64, last_used: i64) -> Option<i64> {
    if value != reserved_end {
        return None;
    }
    let lowered = last_used.max(floor);
    (lowered < reserved_end).then_some(lowered)
}

fn checked_add(key: &SequenceKey, value: i64, count: i64) -> SequenceResult<i64> {
    value
        .checked_add(count)
        .ok_or_else(|| SequenceError::Overflow(key.clone()))
}

fn check_count(count: i64) -> SequenceResult<()> {
    if count < 1 {
        return Err(SequenceError::InvalidCount(count));
    }
    Ok(())
}
