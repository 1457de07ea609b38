//! RocksDB backend
//!
//! Holds the JSON-encoded collection in the `meta` column family and one
//! JSON-encoded snapshot per key in the `snapshots` column family. The
//! occupied key range is itself kept as metadata so push and pop are single
//! atomic write batches.

use crate::keys::{decode_u64, meta, KeyBuilder};
use crate::options::StorageOptions;
use crate::store::{SnapshotStack, Store};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::sync::{Arc, Mutex};
use tabula_core::{DatabaseSet, Error, Result};
use tracing::{debug, info};

/// Column family names
pub mod cf {
    pub const META: &str = "meta";
    pub const SNAPSHOTS: &str = "snapshots";
}

/// All column families used by Tabula
pub const COLUMN_FAMILIES: &[&str] = &[cf::META, cf::SNAPSHOTS];

/// Store and snapshot stack backed by RocksDB
pub struct RocksStore {
    db: Arc<DB>,
    options: StorageOptions,
    snapshot_lock: Arc<Mutex<()>>,
}

impl RocksStore {
    /// Open or create a new store
    pub fn open(options: StorageOptions) -> Result<Self> {
        info!("Opening RocksDB store at {:?}", options.path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(options.create_if_missing);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, &options.path, cf_descriptors)
            .map_err(|e| Error::Storage(e.to_string()))?;

        info!("RocksDB store opened successfully");

        Ok(Self {
            db: Arc::new(db),
            options,
            snapshot_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Internal(format!("Column family not found: {}", name)))
    }

    fn write_options(&self) -> rocksdb::WriteOptions {
        let mut opts = rocksdb::WriteOptions::default();
        opts.set_sync(self.options.sync_on_write);
        opts
    }

    fn read_position(&self, name: &str) -> Result<u64> {
        let cf = self.cf(cf::META)?;
        let raw = self
            .db
            .get_cf(cf, KeyBuilder::meta(name))
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(raw.as_deref().and_then(decode_u64).unwrap_or(0))
    }

    /// Occupied snapshot positions as `(bottom, top)`, top exclusive
    fn snapshot_bounds(&self) -> Result<(u64, u64)> {
        Ok((
            self.read_position(meta::SNAPSHOT_BOTTOM)?,
            self.read_position(meta::SNAPSHOT_TOP)?,
        ))
    }

    fn put_bounds(&self, batch: &mut WriteBatch, bottom: u64, top: u64) -> Result<()> {
        let cf = self.cf(cf::META)?;
        batch.put_cf(cf, KeyBuilder::meta(meta::SNAPSHOT_BOTTOM), bottom.to_be_bytes());
        batch.put_cf(cf, KeyBuilder::meta(meta::SNAPSHOT_TOP), top.to_be_bytes());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.snapshot_lock
            .lock()
            .map_err(|_| Error::Internal("Failed to acquire snapshot lock".to_string()))
    }

    /// Flush all in-memory data to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush().map_err(|e| Error::Storage(e.to_string()))
    }
}

impl Clone for RocksStore {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            options: self.options.clone(),
            snapshot_lock: Arc::clone(&self.snapshot_lock),
        }
    }
}

impl Store for RocksStore {
    fn load(&self) -> Result<DatabaseSet> {
        let cf = self.cf(cf::META)?;
        match self
            .db
            .get_cf(cf, KeyBuilder::meta(meta::DATABASES))
            .map_err(|e| Error::Storage(e.to_string()))?
        {
            Some(data) => {
                serde_json::from_slice(&data).map_err(|e| Error::Deserialization(e.to_string()))
            }
            None => Ok(DatabaseSet::new()),
        }
    }

    fn save(&self, set: &DatabaseSet) -> Result<()> {
        let data = serde_json::to_vec(set).map_err(|e| Error::Serialization(e.to_string()))?;
        let cf = self.cf(cf::META)?;
        self.db
            .put_cf_opt(cf, KeyBuilder::meta(meta::DATABASES), &data, &self.write_options())
            .map_err(|e| Error::Storage(e.to_string()))?;
        debug!("Saved {} database(s) ({} bytes)", set.len(), data.len());
        Ok(())
    }
}

impl SnapshotStack for RocksStore {
    fn push(&self, snapshot: DatabaseSet) -> Result<()> {
        let _guard = self.lock()?;
        let (mut bottom, top) = self.snapshot_bounds()?;
        let data =
            serde_json::to_vec(&snapshot).map_err(|e| Error::Serialization(e.to_string()))?;

        let snapshots = self.cf(cf::SNAPSHOTS)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(snapshots, KeyBuilder::snapshot(top), &data);

        if let Some(limit) = self.options.snapshot_limit {
            while top + 1 - bottom > limit as u64 {
                batch.delete_cf(snapshots, KeyBuilder::snapshot(bottom));
                bottom += 1;
            }
        }
        self.put_bounds(&mut batch, bottom, top + 1)?;

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    fn pop(&self) -> Result<Option<DatabaseSet>> {
        let _guard = self.lock()?;
        let (bottom, top) = self.snapshot_bounds()?;
        if top == bottom {
            return Ok(None);
        }

        let key = KeyBuilder::snapshot(top - 1);
        let snapshots = self.cf(cf::SNAPSHOTS)?;
        let data = self
            .db
            .get_cf(snapshots, &key)
            .map_err(|e| Error::Storage(e.to_string()))?
            .ok_or_else(|| Error::Storage(format!("Snapshot {} missing", top - 1)))?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(snapshots, &key);
        if top - 1 == bottom {
            self.put_bounds(&mut batch, 0, 0)?;
        } else {
            self.put_bounds(&mut batch, bottom, top - 1)?;
        }
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| Error::Storage(e.to_string()))?;

        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;
        let (bottom, top) = self.snapshot_bounds()?;
        let snapshots = self.cf(cf::SNAPSHOTS)?;

        let mut batch = WriteBatch::default();
        for position in bottom..top {
            batch.delete_cf(snapshots, KeyBuilder::snapshot(position));
        }
        self.put_bounds(&mut batch, 0, 0)?;
        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    fn depth(&self) -> Result<usize> {
        let (bottom, top) = self.snapshot_bounds()?;
        Ok((top - bottom) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Database;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let options = StorageOptions::for_testing(temp_dir.path());
        let store = RocksStore::open(options).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_open_store() {
        let (store, _dir) = create_test_store();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.depth().unwrap(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let (store, _dir) = create_test_store();
        let mut set = DatabaseSet::new();
        set.push(Database::new("main"));

        store.save(&set).unwrap();
        assert_eq!(store.load().unwrap(), set);
    }

    #[test]
    fn test_snapshot_limit_drops_bottom() {
        let temp_dir = TempDir::new().unwrap();
        let options = StorageOptions::for_testing(temp_dir.path()).snapshot_limit(Some(2));
        let store = RocksStore::open(options).unwrap();

        for name in ["one", "two", "three"] {
            let mut set = DatabaseSet::new();
            set.push(Database::new(name));
            store.push(set).unwrap();
        }
        assert_eq!(store.depth().unwrap(), 2);
        assert!(store.pop().unwrap().unwrap().find_by_name("three").is_some());
        assert!(store.pop().unwrap().unwrap().find_by_name("two").is_some());
        assert!(store.pop().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_stack() {
        let (store, _dir) = create_test_store();
        let mut set = DatabaseSet::new();
        store.push(set.clone()).unwrap();
        set.push(Database::new("second"));
        store.push(set).unwrap();
        assert_eq!(store.depth().unwrap(), 2);

        let top = store.pop().unwrap().unwrap();
        assert_eq!(top.len(), 1);

        store.clear().unwrap();
        assert_eq!(store.depth().unwrap(), 0);
        assert!(store.pop().unwrap().is_none());
    }
}
