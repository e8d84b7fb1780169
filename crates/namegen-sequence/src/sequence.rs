use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::errors::{SequenceError, SequenceResult};
use crate::key::SequenceKey;
use crate::store::SequenceStore;

#[derive(Debug)]
struct Block {
    /// Next value to hand out.
    next: i64,
    /// Last reserved value (inclusive); the block is empty once `next > end`.
    end: i64,
    last_issued: Option<i64>,
    reservations: u64,
}

impl Block {
    fn empty() -> Self {
        Self {
            next: 1,
            end: 0,
            last_issued: None,
            reservations: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.next > self.end
    }
}

/// Shared handle on one durable counter that reserves values in blocks.
///
/// Each storage reservation claims `block_size` values at once; `next()`
/// serves them locally until the block runs out. Values are never reused and
/// never decrease. Values of a block that is still outstanding when the
/// process dies are burned.
pub struct PreallocatingSequence {
    key: SequenceKey,
    block_size: i64,
    store: Arc<dyn SequenceStore>,
    block: Mutex<Block>,
}

impl PreallocatingSequence {
    pub fn new(store: Arc<dyn SequenceStore>, key: SequenceKey, block_size: i64) -> Self {
        Self {
            key,
            block_size: block_size.max(1),
            store,
            block: Mutex::new(Block::empty()),
        }
    }

    pub fn key(&self) -> &SequenceKey {
        &self.key
    }

    pub fn block_size(&self) -> i64 {
        self.block_size
    }

    fn lock(&self) -> SequenceResult<MutexGuard<'_, Block>> {
        self.block.lock().map_err(|_| SequenceError::Poisoned)
    }

    pub fn next(&self) -> SequenceResult<i64> {
        let mut block = self.lock()?;
        if block.is_empty() {
            let first = self.store.reserve(&self.key, self.block_size)?;
            block.next = first;
            block.end = first + self.block_size - 1;
            block.reservations += 1;
            debug!(
                sequence = %self.key,
                first,
                end = block.end,
                "reserved sequence block"
            );
        }
        let value = block.next;
        block.next += 1;
        block.last_issued = Some(value);
        Ok(value)
    }

    /// Last value issued by this handle, or the stored value when this
    /// handle has not issued anything yet (0 for an unused counter).
    pub fn current(&self) -> SequenceResult<i64> {
        let block = self.lock()?;
        match block.last_issued {
            Some(value) => Ok(value),
            None => self.store.current(&self.key),
        }
    }

    /// Guarantee that later `next()` calls return values above `floor`.
    pub fn ensure_minimum(&self, floor: i64) -> SequenceResult<()> {
        let mut block = self.lock()?;
        if !block.is_empty() && block.next <= floor {
            // skip ahead inside the block, or drop it when the floor passes its end
            block.next = floor.saturating_add(1).min(block.end.saturating_add(1));
        }
        let stored = self.store.ensure_minimum(&self.key, floor)?;
        debug!(sequence = %self.key, floor, stored, "ensured sequence minimum");
        Ok(())
    }

    /// Hand the unused tail of the current block back to the store when no
    /// other reservation followed it, then forget the block.
    pub fn sync(&self) -> SequenceResult<()> {
        let mut block = self.lock()?;
        if block.is_empty() {
            return Ok(());
        }
        let last_used = block.next - 1;
        let released = self.store.release(&self.key, block.end, last_used)?;
        debug!(
            sequence = %self.key,
            reserved_end = block.end,
            last_used,
            released,
            "synced sequence block"
        );
        block.next = block.end + 1;
        Ok(())
    }

    /// Number of storage reservations made by this handle.
    pub fn reservations(&self) -> u64 {
        self.lock().map(|block| block.reservations).unwrap_or(0)
    }
}

impl std::fmt::Debug for PreallocatingSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreallocatingSequence")
            .field("key", &self.key)
            .field("block_size", &self.block_size)
            .finish()
    }
}
