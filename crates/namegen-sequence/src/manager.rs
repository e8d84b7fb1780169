use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::errors::{SequenceError, SequenceResult};
use crate::key::SequenceKey;
use crate::sequence::PreallocatingSequence;
use crate::store::SequenceStore;

pub const DEFAULT_BLOCK_SIZE: i64 = 100;

/// Per-process registry of sequence handles over one store.
///
/// Every caller asking for the same key and block size shares one handle, so
/// blocks reserved by one generation batch keep serving the next.
pub struct SequenceManager {
    store: Arc<dyn SequenceStore>,
    block_size: i64,
    handles: Mutex<HashMap<(SequenceKey, i64), Arc<PreallocatingSequence>>>,
}

impl SequenceManager {
    pub fn new(store: Arc<dyn SequenceStore>, block_size: i64) -> Self {
        Self {
            store,
            block_size: block_size.max(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SequenceStore> {
        &self.store
    }

    pub fn block_size(&self) -> i64 {
        self.block_size
    }

    /// Preallocating handle using the manager's block size.
    pub fn get(&self, key: &SequenceKey) -> SequenceResult<Arc<PreallocatingSequence>> {
        self.get_with_block_size(key, self.block_size)
    }

    /// Handle that reserves one value per draw, so no value is ever burned.
    pub fn get_unbuffered(&self, key: &SequenceKey) -> SequenceResult<Arc<PreallocatingSequence>> {
        self.get_with_block_size(key, 1)
    }

    pub fn get_with_block_size(
        &self,
        key: &SequenceKey,
        block_size: i64,
    ) -> SequenceResult<Arc<PreallocatingSequence>> {
        let mut handles = self.handles.lock().map_err(|_| SequenceError::Poisoned)?;
        let handle = handles
            .entry((key.clone(), block_size))
            .or_insert_with(|| {
                debug!(sequence = %key, block_size, "opened sequence handle");
                Arc::new(PreallocatingSequence::new(
                    Arc::clone(&self.store),
                    key.clone(),
                    block_size,
                ))
            });
        Ok(Arc::clone(handle))
    }

    /// Sync every handle, returning the first failure after trying all.
    pub fn sync_all(&self) -> SequenceResult<()> {
        let handles: Vec<_> = {
            let handles = self.handles.lock().map_err(|_| SequenceError::Poisoned)?;
            handles.values().cloned().collect()
        };
        let mut first_error = None;
        for handle in handles {
            if let Err(err) = handle.sync() {
                warn!(sequence = %handle.key(), error = %err, "failed to sync sequence");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for SequenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceManager")
            .field("store", &self.store.describe())
            .field("block_size", &self.block_size)
            .finish()
    }
}
