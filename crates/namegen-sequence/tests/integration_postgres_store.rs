use std::env;

use anyhow::Result;
use namegen_sequence::{PgSequenceStore, PreallocatingSequence, SequenceKey, SequenceStore};
use std::sync::Arc;

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

#[test]
fn postgres_store_reserves_atomically() -> Result<()> {
    let Some(db_url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL for integration tests");
        return Ok(());
    };

    let store = Arc::new(PgSequenceStore::connect(&db_url, "postgres:test")?);
    let key = SequenceKey::new(format!("test-{}", uuid::Uuid::new_v4()), "sample:genId");

    assert_eq!(store.current(&key)?, 0);
    assert_eq!(store.reserve(&key, 100)?, 1);
    assert_eq!(store.reserve(&key, 100)?, 101);
    assert_eq!(store.ensure_minimum(&key, 150)?, 200);
    assert_eq!(store.ensure_minimum(&key, 500)?, 500);
    assert!(!store.release(&key, 500, 480)?);
    assert_eq!(store.reserve(&key, 100)?, 501);
    assert!(store.release(&key, 600, 520)?);
    assert!(!store.release(&key, 600, 510)?);
    assert_eq!(store.current(&key)?, 520);

    let seq = PreallocatingSequence::new(store.clone(), key.clone(), 10);
    assert_eq!(seq.next()?, 521);
    seq.sync()?;
    assert_eq!(store.current(&key)?, 521);

    let floored = SequenceKey::new(key.scope.clone(), "sample:floored");
    assert_eq!(store.reserve(&floored, 100)?, 1);
    store.ensure_minimum(&floored, 50)?;
    assert!(store.release(&floored, 100, 1)?);
    assert_eq!(store.current(&floored)?, 50);

    Ok(())
}
