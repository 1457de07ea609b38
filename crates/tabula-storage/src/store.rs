//! Persistence capabilities and in-memory backends
//!
//! The interpreter never touches storage directly. It loads and saves the
//! whole [`DatabaseSet`] through a [`Store`] and keeps rollback points on a
//! [`SnapshotStack`].

use std::sync::{Arc, RwLock};
use tabula_core::{DatabaseSet, Error, Result};
use tracing::debug;

/// Get/set access to the persisted database collection
pub trait Store: Send + Sync {
    /// Load a fresh copy of the full collection
    fn load(&self) -> Result<DatabaseSet>;

    /// Replace the persisted collection
    fn save(&self, set: &DatabaseSet) -> Result<()>;
}

/// Stack of full-collection snapshots used for rollback
pub trait SnapshotStack: Send + Sync {
    /// Push a snapshot on top
    fn push(&self, snapshot: DatabaseSet) -> Result<()>;

    /// Pop the most recent snapshot
    fn pop(&self) -> Result<Option<DatabaseSet>>;

    /// Discard every snapshot
    fn clear(&self) -> Result<()>;

    /// Number of snapshots currently held
    fn depth(&self) -> Result<usize>;
}

impl<T: Store + ?Sized> Store for Arc<T> {
    fn load(&self) -> Result<DatabaseSet> {
        (**self).load()
    }

    fn save(&self, set: &DatabaseSet) -> Result<()> {
        (**self).save(set)
    }
}

impl<T: SnapshotStack + ?Sized> SnapshotStack for Arc<T> {
    fn push(&self, snapshot: DatabaseSet) -> Result<()> {
        (**self).push(snapshot)
    }

    fn pop(&self) -> Result<Option<DatabaseSet>> {
        (**self).pop()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn depth(&self) -> Result<usize> {
        (**self).depth()
    }
}

fn poisoned() -> Error {
    Error::Internal("Failed to acquire store lock".to_string())
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<DatabaseSet>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing collection
    pub fn with_data(set: DatabaseSet) -> Self {
        Self {
            inner: RwLock::new(set),
        }
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<DatabaseSet> {
        let set = self.inner.read().map_err(|_| poisoned())?;
        Ok(set.clone())
    }

    fn save(&self, set: &DatabaseSet) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        *inner = set.clone();
        debug!("Saved {} database(s) to memory store", set.len());
        Ok(())
    }
}

/// In-memory snapshot stack
#[derive(Debug, Default)]
pub struct MemorySnapshotStack {
    stack: RwLock<Vec<DatabaseSet>>,
    limit: Option<usize>,
}

impl MemorySnapshotStack {
    /// Create an unbounded stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack that keeps at most `limit` snapshots
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stack: RwLock::new(Vec::new()),
            limit: Some(limit),
        }
    }
}

impl SnapshotStack for MemorySnapshotStack {
    fn push(&self, snapshot: DatabaseSet) -> Result<()> {
        let mut stack = self.stack.write().map_err(|_| poisoned())?;
        stack.push(snapshot);
        trim_to_limit(&mut stack, self.limit);
        Ok(())
    }

    fn pop(&self) -> Result<Option<DatabaseSet>> {
        let mut stack = self.stack.write().map_err(|_| poisoned())?;
        Ok(stack.pop())
    }

    fn clear(&self) -> Result<()> {
        let mut stack = self.stack.write().map_err(|_| poisoned())?;
        stack.clear();
        Ok(())
    }

    fn depth(&self) -> Result<usize> {
        let stack = self.stack.read().map_err(|_| poisoned())?;
        Ok(stack.len())
    }
}

/// Drop the oldest snapshots until the stack fits the limit
pub(crate) fn trim_to_limit(stack: &mut Vec<DatabaseSet>, limit: Option<usize>) {
    if let Some(limit) = limit {
        if stack.len() > limit {
            let excess = stack.len() - limit;
            stack.drain(..excess);
            debug!("Discarded {} oldest snapshot(s)", excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::Database;

    fn set_with(names: &[&str]) -> DatabaseSet {
        names.iter().map(|n| Database::new(*n)).collect()
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let set = set_with(&["a", "b"]);
        store.save(&set).unwrap();
        assert_eq!(store.load().unwrap(), set);
    }

    #[test]
    fn test_load_returns_independent_copy() {
        let store = MemoryStore::with_data(set_with(&["a"]));
        let mut copy = store.load().unwrap();
        copy.push(Database::new("b"));

        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_stack_lifo() {
        let stack = MemorySnapshotStack::new();
        stack.push(set_with(&["first"])).unwrap();
        stack.push(set_with(&["second"])).unwrap();
        assert_eq!(stack.depth().unwrap(), 2);

        let top = stack.pop().unwrap().unwrap();
        assert!(top.find_by_name("second").is_some());

        stack.clear().unwrap();
        assert_eq!(stack.depth().unwrap(), 0);
        assert!(stack.pop().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_stack_limit_discards_oldest() {
        let stack = MemorySnapshotStack::with_limit(2);
        stack.push(set_with(&["one"])).unwrap();
        stack.push(set_with(&["two"])).unwrap();
        stack.push(set_with(&["three"])).unwrap();

        assert_eq!(stack.depth().unwrap(), 2);
        assert!(stack.pop().unwrap().unwrap().find_by_name("three").is_some());
        assert!(stack.pop().unwrap().unwrap().find_by_name("two").is_some());
        assert!(stack.pop().unwrap().is_none());
    }

    #[test]
    fn test_arc_store_shares_state() {
        let store = Arc::new(MemoryStore::new());
        let handle: Arc<MemoryStore> = Arc::clone(&store);
        handle.save(&set_with(&["shared"])).unwrap();
        assert_eq!(Store::load(&store).unwrap().len(), 1);
    }
}
