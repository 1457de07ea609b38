//! Snapshot-based transactions
//!
//! Rollback points are full copies of the database collection kept on a
//! [`SnapshotStack`]. [`TransactionMode`] decides when copies are taken and
//! what COMMIT and ROLLBACK do with them.

use serde::{Deserialize, Serialize};
use tabula_core::{DatabaseSet, Result};
use tabula_storage::SnapshotStack;
use tracing::{debug, info, warn};

/// Snapshot policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Every mutating statement snapshots first, even if it then fails.
    /// BEGIN pushes, COMMIT clears the whole stack, ROLLBACK pops one.
    #[default]
    Literal,

    /// Statements snapshot only after success and only outside a
    /// transaction. COMMIT and ROLLBACK act on the innermost BEGIN.
    Scoped,
}

/// What a ROLLBACK produced
#[derive(Debug, Clone, PartialEq)]
pub enum RollbackOutcome {
    /// The collection to restore
    Restored(DatabaseSet),
    /// Nothing on the stack
    NothingToRollback,
}

/// Tracks open transactions and drives the snapshot stack
#[derive(Debug, Clone, Default)]
pub struct TransactionManager {
    mode: TransactionMode,
    depth: usize,
}

impl TransactionManager {
    /// Create a manager with the given policy
    pub fn new(mode: TransactionMode) -> Self {
        Self { mode, depth: 0 }
    }

    /// Active policy
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Number of open BEGINs
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a BEGIN is open
    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    /// Whether the caller must keep a pre-statement copy for [`Self::after_mutation`]
    pub fn needs_pre_state(&self) -> bool {
        self.mode == TransactionMode::Scoped && !self.in_transaction()
    }

    /// Called before a mutating statement runs
    pub fn before_mutation<K: SnapshotStack + ?Sized>(
        &self,
        stack: &K,
        current: &DatabaseSet,
    ) -> Result<()> {
        if self.mode == TransactionMode::Literal {
            stack.push(current.clone())?;
            debug!("Statement snapshot pushed (depth {})", stack.depth()?);
        }
        Ok(())
    }

    /// Called after a mutating statement succeeded, with the state it started from
    pub fn after_mutation<K: SnapshotStack + ?Sized>(
        &self,
        stack: &K,
        previous: DatabaseSet,
    ) -> Result<()> {
        if self.needs_pre_state() {
            stack.push(previous)?;
            debug!("Statement snapshot pushed (depth {})", stack.depth()?);
        }
        Ok(())
    }

    /// BEGIN: push the current state
    pub fn begin<K: SnapshotStack + ?Sized>(
        &mut self,
        stack: &K,
        current: &DatabaseSet,
    ) -> Result<String> {
        stack.push(current.clone())?;
        self.depth += 1;
        info!("Transaction started (level {})", self.depth);
        Ok(if self.depth > 1 {
            format!("Transaction started (nested level {})", self.depth)
        } else {
            "Transaction started".to_string()
        })
    }

    /// COMMIT
    pub fn commit<K: SnapshotStack + ?Sized>(&mut self, stack: &K) -> Result<String> {
        match self.mode {
            TransactionMode::Literal => {
                stack.clear()?;
                self.depth = 0;
                info!("Transaction committed, snapshots cleared");
                Ok("Transaction committed".to_string())
            }
            TransactionMode::Scoped => {
                if !self.in_transaction() {
                    warn!("COMMIT outside a transaction");
                    return Ok("No transaction in progress".to_string());
                }
                stack.pop()?;
                self.depth -= 1;
                info!("Transaction committed (level {} remaining)", self.depth);
                Ok("Transaction committed".to_string())
            }
        }
    }

    /// ROLLBACK: pop the most recent rollback point
    ///
    /// The caller persists a restored collection and revalidates its
    /// selection.
    pub fn rollback<K: SnapshotStack + ?Sized>(&mut self, stack: &K) -> Result<RollbackOutcome> {
        match stack.pop()? {
            Some(snapshot) => {
                self.depth = self.depth.saturating_sub(1);
                info!("Rolled back to snapshot ({} remaining)", stack.depth()?);
                Ok(RollbackOutcome::Restored(snapshot))
            }
            None => {
                self.depth = 0;
                warn!("ROLLBACK with an empty snapshot stack");
                Ok(RollbackOutcome::NothingToRollback)
            }
        }
    }
}
