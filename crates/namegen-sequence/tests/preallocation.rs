use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::NaiveDate;
use namegen_sequence::{
    FileSequenceStore, MemorySequenceStore, PreallocatingSequence, ProjectCounter, SampleCounters,
    SequenceKey, SequenceManager, SequenceResult, SequenceStore,
};

/// Store wrapper counting storage round trips.
#[derive(Default)]
struct CountingStore {
    inner: MemorySequenceStore,
    reserves: AtomicUsize,
}

impl SequenceStore for CountingStore {
    fn reserve(&self, key: &SequenceKey, count: i64) -> SequenceResult<i64> {
        self.reserves.fetch_add(1, Ordering::SeqCst);
        self.inner.reserve(key, count)
    }

    fn ensure_minimum(&self, key: &SequenceKey, floor: i64) -> SequenceResult<i64> {
        self.inner.ensure_minimum(key, floor)
    }

    fn current(&self, key: &SequenceKey) -> SequenceResult<i64> {
        self.inner.current(key)
    }

    fn release(
        &self,
        key: &SequenceKey,
        reserved_end: i64,
        last_used: i64,
    ) -> SequenceResult<bool> {
        self.inner.release(key, reserved_end, last_used)
    }

    fn describe(&self) -> String {
        "counting".to_string()
    }
}

#[test]
fn block_boundary_reserves_exactly_once_more() {
    let store = Arc::new(CountingStore::default());
    let seq = PreallocatingSequence::new(
        store.clone(),
        SequenceKey::new("project", "sample:genId"),
        100,
    );

    for expected in 1..=100 {
        assert_eq!(seq.next().expect("next"), expected);
    }
    assert_eq!(store.reserves.load(Ordering::SeqCst), 1);

    assert_eq!(seq.next().expect("101"), 101);
    assert_eq!(store.reserves.load(Ordering::SeqCst), 2);
    assert_eq!(seq.reservations(), 2);
}

#[test]
fn handles_sharing_a_store_never_overlap() {
    let store: Arc<dyn SequenceStore> = Arc::new(MemorySequenceStore::new());
    let key = SequenceKey::new("project", "data:genId").with_sub_id(7);
    let a = PreallocatingSequence::new(Arc::clone(&store), key.clone(), 10);
    let b = PreallocatingSequence::new(Arc::clone(&store), key, 10);

    let mut seen = HashSet::new();
    for _ in 0..35 {
        assert!(seen.insert(a.next().expect("a")));
        assert!(seen.insert(b.next().expect("b")));
    }
    assert_eq!(seen.len(), 70);
}

#[test]
fn concurrent_draws_are_unique() {
    let manager = Arc::new(SequenceManager::new(
        Arc::new(MemorySequenceStore::new()),
        16,
    ));
    let key = SequenceKey::new("project", "sample:genId");

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let key = key.clone();
            thread::spawn(move || {
                let seq = manager.get(&key).expect("handle");
                (0..250)
                    .map(|_| seq.next().expect("next"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for worker in workers {
        for value in worker.join().expect("worker") {
            assert!(all.insert(value), "value {value} issued twice");
        }
    }
    assert_eq!(all.len(), 1000);
    assert_eq!(all.iter().max().copied(), Some(1000));
}

#[test]
fn manager_shares_handles_per_key_and_block_size() {
    let manager = SequenceManager::new(Arc::new(MemorySequenceStore::new()), 100);
    let key = SequenceKey::new("project", "counter");
    let first = manager.get(&key).expect("first");
    let again = manager.get(&key).expect("again");
    assert!(Arc::ptr_eq(&first, &again));
    let unbuffered = manager.get_unbuffered(&key).expect("unbuffered");
    assert!(!Arc::ptr_eq(&first, &unbuffered));
    assert_eq!(unbuffered.block_size(), 1);
}

#[test]
fn sync_all_hands_back_unused_values() {
    let manager = SequenceManager::new(Arc::new(MemorySequenceStore::new()), 100);
    let key = SequenceKey::new("project", "counter");
    manager.get(&key).expect("handle").next().expect("next");
    manager.sync_all().expect("sync");
    assert_eq!(manager.store().current(&key).expect("current"), 1);
}

#[test]
fn released_tail_respects_floor_from_other_handle() {
    let store: Arc<dyn SequenceStore> = Arc::new(MemorySequenceStore::new());
    let key = SequenceKey::new("project", "sample:genId");
    let a = PreallocatingSequence::new(Arc::clone(&store), key.clone(), 100);
    let b = PreallocatingSequence::new(Arc::clone(&store), key, 100);

    assert_eq!(a.next().expect("a"), 1);
    b.ensure_minimum(50).expect("floor");
    a.sync().expect("sync");

    let value = b.next().expect("b");
    assert!(value > 50, "issued {value} at or below the floor");
    assert_eq!(value, 51);
}

#[test]
fn file_store_release_respects_floor() {
    let path = std::env::temp_dir().join(format!("namegen-floor-{}.json", uuid::Uuid::new_v4()));
    let key = SequenceKey::new("project", "counter");
    let store = FileSequenceStore::open(&path).expect("open");

    assert_eq!(store.reserve(&key, 100).expect("reserve"), 1);
    store.ensure_minimum(&key, 60).expect("floor");
    assert!(store.release(&key, 100, 3).expect("release"));
    assert_eq!(store.current(&key).expect("current"), 60);

    let reopened = FileSequenceStore::open(&path).expect("reopen");
    assert_eq!(reopened.reserve(&key, 10).expect("reserve"), 61);
    assert!(reopened.release(&key, 70, 55).expect("clamped"));
    assert_eq!(reopened.current(&key).expect("current"), 60);

    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn file_store_survives_reopen() {
    let path = std::env::temp_dir().join(format!("namegen-seq-{}.json", uuid::Uuid::new_v4()));
    let key = SequenceKey::new("project", "sample:genId");

    {
        let store = FileSequenceStore::open(&path).expect("open");
        assert_eq!(store.reserve(&key, 100).expect("reserve"), 1);
        assert!(store.release(&key, 100, 42).expect("release"));
        store
            .ensure_minimum(&SequenceKey::new("project", "other"), 9)
            .expect("floor");
    }

    let reopened = FileSequenceStore::open(&path).expect("reopen");
    assert_eq!(reopened.current(&key).expect("current"), 42);
    assert_eq!(reopened.reserve(&key, 1).expect("reserve"), 43);
    assert_eq!(
        reopened
            .current(&SequenceKey::new("project", "other"))
            .expect("other"),
        9
    );
    assert!(reopened.describe().starts_with("file:"));

    std::fs::remove_file(&path).expect("cleanup");
}

#[test]
fn sample_counters_bucket_by_period() {
    let manager = Arc::new(SequenceManager::new(
        Arc::new(MemorySequenceStore::new()),
        100,
    ));
    let counters = SampleCounters::new(manager, "project");
    let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).expect("date");
    let jan6 = NaiveDate::from_ymd_opt(2024, 1, 6).expect("date");
    let jan8 = NaiveDate::from_ymd_opt(2024, 1, 8).expect("date");

    let first = counters.increment(jan5).expect("first");
    assert_eq!((first.daily, first.weekly, first.monthly, first.yearly), (1, 1, 1, 1));

    let second = counters.increment(jan6).expect("second");
    assert_eq!((second.daily, second.weekly, second.monthly, second.yearly), (1, 2, 2, 2));

    let next_week = counters.increment(jan8).expect("next week");
    assert_eq!((next_week.daily, next_week.weekly), (1, 1));
    assert_eq!(next_week.yearly, 3);

    assert_eq!(
        counters
            .key(namegen_core::CounterPeriod::Weekly, jan5)
            .name,
        "sample:weekly:2024-W01"
    );
}

#[test]
fn project_counters_are_independent_and_honor_floors() {
    let manager = Arc::new(SequenceManager::new(
        Arc::new(MemorySequenceStore::new()),
        100,
    ));
    let counters = SampleCounters::new(manager, "project");

    assert_eq!(counters.current_project(ProjectCounter::SampleCount).expect("current"), 0);
    counters
        .ensure_project_minimum(ProjectCounter::SampleCount, 239)
        .expect("floor");
    assert_eq!(counters.increment_project(ProjectCounter::SampleCount).expect("count"), 240);
    assert_eq!(counters.increment_project(ProjectCounter::RootSampleCount).expect("root"), 1);
    assert_eq!(counters.current_project(ProjectCounter::SampleCount).expect("current"), 240);

    assert_eq!(counters.project_key(ProjectCounter::RootSampleCount).name, "sample:rootCount");
    assert_eq!(
        ProjectCounter::from_token_name("ROOTSAMPLECOUNT"),
        Some(ProjectCounter::RootSampleCount)
    );
    assert_eq!(ProjectCounter::from_token_name("dailySampleCount"), None);
}
