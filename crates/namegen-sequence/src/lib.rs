//! Durable numeric sequences with block preallocation.
//!
//! A [`SequenceStore`] keeps one atomically incremented counter per
//! [`SequenceKey`]. [`PreallocatingSequence`] reserves blocks of values from a
//! store and hands them out locally so that most draws never touch storage.
//! [`SampleCounters`] layers the dated and project-wide sample counts on top
//! of a [`SequenceManager`].

pub mod atomic;
pub mod counters;
pub mod errors;
pub mod key;
pub mod manager;
pub mod sequence;
pub mod store;

pub use counters::{ProjectCounter, SampleCounters, SampleCounts};
pub use errors::{SequenceError, SequenceResult};
pub use key::SequenceKey;
pub use manager::{DEFAULT_BLOCK_SIZE, SequenceManager};
pub use sequence::PreallocatingSequence;
pub use store::{FileSequenceStore, MemorySequenceStore, PgSequenceStore, SequenceStore};
