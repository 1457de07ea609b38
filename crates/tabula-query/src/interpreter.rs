//! Statement interpreter
//!
//! Classifies statement text, routes it to the executor or the transaction
//! manager and persists the outcome. Each mutating statement loads a fresh
//! working copy from the [`Store`], mutates it and saves it back only after
//! full success.

use crate::editor;
use crate::executor::{Executor, Outcome, QueryResult};
use crate::notify::{ChangeNotice, DataChange, DataChangeListener};
use crate::parser::{parse, Command, Statement, TransactionControl};
use crate::transaction::{RollbackOutcome, TransactionManager, TransactionMode};
use std::sync::Arc;
use tabula_core::{DatabaseId, DatabaseSet, Result, RowId, Value};
use tabula_storage::{SnapshotStack, Store};
use tracing::{debug, info};

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterOptions {
    /// Snapshot policy for statements and BEGIN/COMMIT/ROLLBACK
    pub transaction_mode: TransactionMode,
}

impl InterpreterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transaction mode
    pub fn transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.transaction_mode = mode;
        self
    }
}

/// Executes statement text against a store
pub struct Interpreter<S, K> {
    store: S,
    snapshots: K,
    transactions: TransactionManager,
    listeners: Vec<Arc<dyn DataChangeListener>>,
}

impl<S: Store, K: SnapshotStack> Interpreter<S, K> {
    /// Create an interpreter with default options
    pub fn new(store: S, snapshots: K) -> Self {
        Self::with_options(store, snapshots, InterpreterOptions::default())
    }

    /// Create an interpreter with explicit options
    pub fn with_options(store: S, snapshots: K, options: InterpreterOptions) -> Self {
        Self {
            store,
            snapshots,
            transactions: TransactionManager::new(options.transaction_mode),
            listeners: Vec::new(),
        }
    }

    /// Register a change listener
    pub fn subscribe(&mut self, listener: Arc<dyn DataChangeListener>) {
        self.listeners.push(listener);
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot stack
    pub fn snapshots(&self) -> &K {
        &self.snapshots
    }

    /// Transaction state
    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    /// Execute one statement
    ///
    /// `active` is the caller's selected database. USE, CREATE DATABASE,
    /// DROP DATABASE and ROLLBACK may change it.
    pub fn execute(&mut self, text: &str, active: &mut Option<DatabaseId>) -> Result<QueryResult> {
        let statement = parse(text)?;

        match statement {
            Statement::Control(control) => self.control(control, active),
            Statement::Command(command) if command.is_mutating() => {
                self.mutate(active, |set, active| Executor::new(set, active).execute(&command))
            }
            Statement::Command(command) => self.read(&command, active),
        }
    }

    // ========== Row editing ==========

    /// Insert a row through type coercion
    pub fn insert_row<N, V>(
        &mut self,
        active: Option<DatabaseId>,
        table: &str,
        values: &[(N, V)],
    ) -> Result<RowId>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut active = active;
        let mut row_id = None;
        self.mutate(&mut active, |set, active| {
            let mut executor = Executor::new(set, active);
            let target = executor.table_mut(table)?;
            let id = editor::insert_coerced(
                target,
                values.iter().map(|(n, v)| (n.as_ref(), v.as_ref())),
            )?;
            row_id = Some(id);
            debug!("Inserted row {} into {} via editor", id, table);
            Ok(Outcome {
                result: QueryResult::Message(format!("1 row inserted (id {})", id)),
                notice: Some(executor.active_notice(DataChange::RowsChanged)?),
            })
        })?;
        row_id.ok_or_else(|| tabula_core::Error::Internal("insert produced no row id".into()))
    }

    /// Overwrite one cell through type coercion, returning the stored value
    pub fn update_cell(
        &mut self,
        active: Option<DatabaseId>,
        table: &str,
        row_id: RowId,
        column: &str,
        raw: &str,
    ) -> Result<Value> {
        let mut active = active;
        let mut stored = Value::Null;
        self.mutate(&mut active, |set, active| {
            let mut executor = Executor::new(set, active);
            let target = executor.table_mut(table)?;
            stored = editor::update_cell(target, row_id, column, raw)?;
            Ok(Outcome {
                result: QueryResult::Message("1 cell updated".to_string()),
                notice: Some(executor.active_notice(DataChange::RowsChanged)?),
            })
        })?;
        Ok(stored)
    }

    /// Delete rows by id
    pub fn delete_rows(
        &mut self,
        active: Option<DatabaseId>,
        table: &str,
        ids: &[RowId],
    ) -> Result<usize> {
        let mut active = active;
        let mut removed = 0;
        self.mutate(&mut active, |set, active| {
            let mut executor = Executor::new(set, active);
            let target = executor.table_mut(table)?;
            removed = editor::delete_rows(target, ids)?;
            Ok(Outcome {
                result: QueryResult::Message(format!("{} row(s) deleted", removed)),
                notice: Some(executor.active_notice(DataChange::RowsChanged)?),
            })
        })?;
        Ok(removed)
    }

    // ========== Internals ==========

    fn read(&self, command: &Command, active: &mut Option<DatabaseId>) -> Result<QueryResult> {
        let mut set = self.store.load()?;
        let outcome = Executor::new(&mut set, active).execute(command)?;
        Ok(outcome.result)
    }

    /// Snapshot, run `f` on a working copy, persist and notify
    fn mutate<F>(&mut self, active: &mut Option<DatabaseId>, f: F) -> Result<QueryResult>
    where
        F: FnOnce(&mut DatabaseSet, &mut Option<DatabaseId>) -> Result<Outcome>,
    {
        let mut set = self.store.load()?;
        self.transactions.before_mutation(&self.snapshots, &set)?;
        let previous = self.transactions.needs_pre_state().then(|| set.clone());

        let mut selection = *active;
        let outcome = f(&mut set, &mut selection)?;

        if let Some(notice) = outcome.notice {
            self.store.save(&set)?;
            *active = selection;
            if let Some(previous) = previous {
                self.transactions.after_mutation(&self.snapshots, previous)?;
            }
            self.notify(&notice);
        } else {
            *active = selection;
        }
        Ok(outcome.result)
    }

    fn control(
        &mut self,
        control: TransactionControl,
        active: &mut Option<DatabaseId>,
    ) -> Result<QueryResult> {
        let message = match control {
            TransactionControl::Begin => {
                let set = self.store.load()?;
                self.transactions.begin(&self.snapshots, &set)?
            }
            TransactionControl::Commit => self.transactions.commit(&self.snapshots)?,
            TransactionControl::Rollback => match self.transactions.rollback(&self.snapshots)? {
                RollbackOutcome::Restored(set) => {
                    self.store.save(&set)?;
                    if active.is_some_and(|id| !set.contains(id)) {
                        info!("Active database no longer exists after rollback");
                        *active = None;
                    }
                    if let Some(database) = active.and_then(|id| set.get(id)) {
                        self.notify(&ChangeNotice::new(database.clone(), DataChange::Restored));
                    }
                    "Rolled back to previous snapshot".to_string()
                }
                RollbackOutcome::NothingToRollback => "Nothing to rollback".to_string(),
            },
        };
        Ok(QueryResult::Message(message))
    }

    fn notify(&self, notice: &ChangeNotice) {
        debug!(
            "Notifying {} listener(s): {} in {}",
            self.listeners.len(),
            notice.change,
            notice.database.name
        );
        for listener in &self.listeners {
            listener.on_data_changed(&notice.database, notice.change);
        }
    }
}
