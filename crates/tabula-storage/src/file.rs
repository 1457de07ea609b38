//! JSON file backends
//!
//! The collection lives in `databases.json` and the snapshot stack in
//! `snapshots.json` inside the configured directory. Every write goes to a
//! temporary sibling file which is then renamed over the target, so readers
//! never observe a half-written file.

use crate::options::StorageOptions;
use crate::store::{trim_to_limit, SnapshotStack, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tabula_core::{DatabaseSet, Error, Result};
use tracing::{debug, info};

/// File name of the persisted collection
pub const DATABASES_FILE: &str = "databases.json";

/// File name of the persisted snapshot stack
pub const SNAPSHOTS_FILE: &str = "snapshots.json";

fn prepare_dir(options: &StorageOptions) -> Result<()> {
    if options.path.is_dir() {
        return Ok(());
    }
    if !options.create_if_missing {
        return Err(Error::Storage(format!(
            "Data directory does not exist: {}",
            options.path.display()
        )));
    }
    fs::create_dir_all(&options.path)?;
    info!("Created data directory {:?}", options.path);
    Ok(())
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let data = fs::read(path)?;
    if data.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(&data).map_err(|e| Error::Deserialization(e.to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T, options: &StorageOptions) -> Result<()> {
    let data = if options.pretty {
        serde_json::to_vec_pretty(value)
    } else {
        serde_json::to_vec(value)
    }
    .map_err(|e| Error::Serialization(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&data)?;
        if options.sync_on_write {
            file.sync_all()?;
        }
    }
    fs::rename(&tmp, path)?;
    debug!("Wrote {} bytes to {:?}", data.len(), path);
    Ok(())
}

/// Store persisting the collection as a JSON document
#[derive(Debug)]
pub struct JsonFileStore {
    file: PathBuf,
    options: StorageOptions,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open or create a store in the configured directory
    pub fn open(options: StorageOptions) -> Result<Self> {
        prepare_dir(&options)?;
        let file = options.path.join(DATABASES_FILE);
        info!("Opened JSON store at {:?}", file);
        Ok(Self {
            file,
            options,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.file
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<DatabaseSet> {
        read_json(&self.file)
    }

    fn save(&self, set: &DatabaseSet) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Internal("Failed to acquire file lock".to_string()))?;
        write_json(&self.file, set, &self.options)
    }
}

/// Snapshot stack persisted as a JSON array, oldest first
///
/// The stack is cached in memory and written through on every change.
#[derive(Debug)]
pub struct JsonSnapshotStack {
    file: PathBuf,
    options: StorageOptions,
    stack: RwLock<Vec<DatabaseSet>>,
}

impl JsonSnapshotStack {
    /// Open or create a snapshot stack in the configured directory
    pub fn open(options: StorageOptions) -> Result<Self> {
        prepare_dir(&options)?;
        let file = options.path.join(SNAPSHOTS_FILE);
        let stack: Vec<DatabaseSet> = read_json(&file)?;
        info!("Opened snapshot stack at {:?} ({} snapshot(s))", file, stack.len());
        Ok(Self {
            file,
            options,
            stack: RwLock::new(stack),
        })
    }

    fn with_stack<T>(&self, f: impl FnOnce(&mut Vec<DatabaseSet>) -> T) -> Result<T> {
        let mut stack = self
            .stack
            .write()
            .map_err(|_| Error::Internal("Failed to acquire snapshot lock".to_string()))?;
        // Memory only changes once the file write succeeded
        let mut next = stack.clone();
        let out = f(&mut next);
        write_json(&self.file, &next, &self.options)?;
        *stack = next;
        Ok(out)
    }
}

impl SnapshotStack for JsonSnapshotStack {
    fn push(&self, snapshot: DatabaseSet) -> Result<()> {
        let limit = self.options.snapshot_limit;
        self.with_stack(|stack| {
            stack.push(snapshot);
            trim_to_limit(stack, limit);
        })
    }

    fn pop(&self) -> Result<Option<DatabaseSet>> {
        self.with_stack(|stack| stack.pop())
    }

    fn clear(&self) -> Result<()> {
        self.with_stack(|stack| stack.clear())
    }

    fn depth(&self) -> Result<usize> {
        let stack = self
            .stack
            .read()
            .map_err(|_| Error::Internal("Failed to acquire snapshot lock".to_string()))?;
        Ok(stack.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Database;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> StorageOptions {
        StorageOptions::for_testing(dir.path())
    }

    #[test]
    fn test_empty_store_loads_empty_set() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(options(&dir)).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let mut set = DatabaseSet::new();
        set.push(Database::new("inventory"));

        {
            let store = JsonFileStore::open(options(&dir)).unwrap();
            store.save(&set).unwrap();
        }

        let store = JsonFileStore::open(options(&dir)).unwrap();
        assert_eq!(store.load().unwrap(), set);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_dir_without_create_fails() {
        let dir = TempDir::new().unwrap();
        let opts = StorageOptions::for_testing(dir.path().join("absent")).create_if_missing(false);
        assert!(JsonFileStore::open(opts).is_err());
    }

    #[test]
    fn test_snapshot_stack_persists() {
        let dir = TempDir::new().unwrap();
        {
            let stack = JsonSnapshotStack::open(options(&dir)).unwrap();
            stack.push(DatabaseSet::new()).unwrap();
            let mut set = DatabaseSet::new();
            set.push(Database::new("x"));
            stack.push(set).unwrap();
        }

        let stack = JsonSnapshotStack::open(options(&dir)).unwrap();
        assert_eq!(stack.depth().unwrap(), 2);
        assert_eq!(stack.pop().unwrap().map(|s| s.len()), Some(1));
        stack.clear().unwrap();

        let reopened = JsonSnapshotStack::open(options(&dir)).unwrap();
        assert_eq!(reopened.depth().unwrap(), 0);
    }

    #[test]
    fn test_failed_write_leaves_stack_untouched() {
        let dir = TempDir::new().unwrap();
        let stack = JsonSnapshotStack::open(options(&dir)).unwrap();
        let mut set = DatabaseSet::new();
        set.push(Database::new("kept"));
        stack.push(set.clone()).unwrap();

        // A directory in place of the temp file makes every write fail
        let blocker = dir.path().join(SNAPSHOTS_FILE).with_extension("json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(stack.push(DatabaseSet::new()).is_err());
        assert!(stack.pop().is_err());
        assert!(stack.clear().is_err());
        assert_eq!(stack.depth().unwrap(), 1);

        std::fs::remove_dir(&blocker).unwrap();
        assert_eq!(stack.pop().unwrap(), Some(set));
        assert_eq!(stack.depth().unwrap(), 0);
    }

    #[test]
    fn test_snapshot_limit_applies() {
        let dir = TempDir::new().unwrap();
        let stack = JsonSnapshotStack::open(options(&dir).snapshot_limit(Some(1))).unwrap();
        stack.push(DatabaseSet::new()).unwrap();
        stack.push(DatabaseSet::new()).unwrap();
        assert_eq!(stack.depth().unwrap(), 1);
    }
}
