use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{SequenceStore, check_count, checked_add, released_value};
use crate::atomic::write_bytes_atomic;
use crate::errors::{SequenceError, SequenceResult};
use crate::key::SequenceKey;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileState {
    sequences: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    #[serde(flatten)]
    key: SequenceKey,
    value: i64,
    #[serde(default)]
    floor: i64,
}

impl FileState {
    fn entry_mut(&mut self, key: &SequenceKey) -> &mut Entry {
        let position = match self.sequences.iter().position(|entry| &entry.key == key) {
            Some(position) => position,
            None => {
                self.sequences.push(Entry {
                    key: key.clone(),
                    value: 0,
                    floor: 0,
                });
                self.sequences.len() - 1
            }
        };
        &mut self.sequences[position]
    }
}

/// JSON-file store for single-process use (CLI runs, local tooling).
///
/// Every mutation rewrites the file atomically before returning, so values
/// survive restarts. Concurrent processes sharing one file are not
/// coordinated; use [`super::PgSequenceStore`] for that.
#[derive(Debug)]
pub struct FileSequenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSequenceStore {
    pub fn open(path: impl Into<PathBuf>) -> SequenceResult<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(SequenceError::Invalid(format!(
                "sequence file path is a directory: {}",
                path.display()
            )));
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> SequenceResult<FileState> {
        if !self.path.exists() {
            return Ok(FileState::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(FileState::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, state: &FileState) -> SequenceResult<()> {
        let data = serde_json::to_vec_pretty(state)?;
        write_bytes_atomic(&self.path, &data)?;
        Ok(())
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&mut FileState) -> SequenceResult<(T, bool)>,
    ) -> SequenceResult<T> {
        let _guard = self.lock.lock().map_err(|_| SequenceError::Poisoned)?;
        let mut state = self.load()?;
        let (out, dirty) = f(&mut state)?;
        if dirty {
            self.save(&state)?;
        }
        Ok(out)
    }
}

impl SequenceStore for FileSequenceStore {
    fn reserve(&self, key: &SequenceKey, count: i64) -> SequenceResult<i64> {
        check_count(count)?;
        self.update(|state| {
            let entry = state.entry_mut(key);
            let end = checked_add(key, entry.value, count)?;
            entry.value = end;
            Ok((end - count + 1, true))
        })
    }

    fn ensure_minimum(&self, key: &SequenceKey, floor: i64) -> SequenceResult<i64> {
        self.update(|state| {
            let entry = state.entry_mut(key);
            if entry.value >= floor && entry.floor >= floor {
                return Ok((entry.value, false));
            }
            entry.floor = entry.floor.max(floor);
            entry.value = entry.value.max(floor);
            Ok((entry.value, true))
        })
    }

    fn current(&self, key: &SequenceKey) -> SequenceResult<i64> {
        let _guard = self.lock.lock().map_err(|_| SequenceError::Poisoned)?;
        let state = self.load()?;
        Ok(state
            .sequences
            .iter()
            .find(|entry| &entry.key == key)
            .map_or(0, |entry| entry.value))
    }

    fn release(
        &self,
        key: &SequenceKey,
        reserved_end: i64,
        last_used: i64,
    ) -> SequenceResult<bool> {
        self.update(|state| {
            let entry = state.entry_mut(key);
            match released_value(entry.value, entry.floor, reserved_end, last_used) {
                Some(lowered) => {
                    entry.value = lowered;
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
