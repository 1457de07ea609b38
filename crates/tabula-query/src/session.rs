//! Interpreter bundled with its own database selection

use crate::executor::QueryResult;
use crate::interpreter::Interpreter;
use tabula_core::{DatabaseId, Error, Result, RowId, Value};
use tabula_storage::{SnapshotStack, Store};

/// An [`Interpreter`] plus the currently selected database
pub struct Session<S, K> {
    interpreter: Interpreter<S, K>,
    active: Option<DatabaseId>,
}

impl<S: Store, K: SnapshotStack> Session<S, K> {
    /// Start a session with no database selected
    pub fn new(interpreter: Interpreter<S, K>) -> Self {
        Self {
            interpreter,
            active: None,
        }
    }

    /// Execute one statement against the session's selection
    pub fn execute(&mut self, text: &str) -> Result<QueryResult> {
        self.interpreter.execute(text, &mut self.active)
    }

    /// Currently selected database id
    pub fn active(&self) -> Option<DatabaseId> {
        self.active
    }

    /// Name of the selected database, if it still exists
    pub fn active_name(&self) -> Result<Option<String>> {
        let Some(id) = self.active else {
            return Ok(None);
        };
        let set = self.interpreter.store().load()?;
        Ok(set.get(id).map(|d| d.name.clone()))
    }

    /// Select a database by name without going through USE
    pub fn select(&mut self, name: &str) -> Result<()> {
        let set = self.interpreter.store().load()?;
        let database = set
            .find_by_name(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))?;
        self.active = Some(database.id);
        Ok(())
    }

    /// Insert a row through type coercion into the selected database
    pub fn insert_row<N: AsRef<str>, V: AsRef<str>>(
        &mut self,
        table: &str,
        values: &[(N, V)],
    ) -> Result<RowId> {
        self.interpreter.insert_row(self.active, table, values)
    }

    /// Overwrite one cell through type coercion
    pub fn update_cell(&mut self, table: &str, row_id: RowId, column: &str, raw: &str) -> Result<Value> {
        self.interpreter.update_cell(self.active, table, row_id, column, raw)
    }

    /// Delete rows by id
    pub fn delete_rows(&mut self, table: &str, ids: &[RowId]) -> Result<usize> {
        self.interpreter.delete_rows(self.active, table, ids)
    }

    pub fn interpreter(&self) -> &Interpreter<S, K> {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<S, K> {
        &mut self.interpreter
    }
}
