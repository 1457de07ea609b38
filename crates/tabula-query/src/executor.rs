//! Statement execution
//!
//! An [`Executor`] applies one parsed [`Command`] to a working copy of the
//! database collection. Callers persist the copy only when execution
//! succeeds, so a failed statement never leaves partial changes behind.

use crate::coercion::parse_type;
use crate::notify::{ChangeNotice, DataChange};
use crate::parser::{
    AlterAction, AlterTableStatement, ColumnDef, Command, CreateTableStatement, DeleteStatement,
    InsertStatement, PermissionStatement, Projection, SelectStatement, UpdateStatement,
};
use crate::predicate::{filter_rows, matching_row_ids};
use chrono::Utc;
use std::collections::BTreeMap;
use tabula_core::{
    BaseType, Column, ColumnId, ColumnMeta, Database, DatabaseId, DatabaseSet, Error, GrantAction,
    PermissionEvent, Result, Row, RowId, Table, Value,
};
use tracing::{debug, info, warn};

/// Statement execution result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Tabular output from SELECT and the introspection statements
    Rows {
        columns: Vec<ColumnMeta>,
        rows: Vec<Row>,
        message: String,
    },

    /// Status text for everything else
    Message(String),
}

impl QueryResult {
    /// Human-readable status line
    pub fn message(&self) -> &str {
        match self {
            QueryResult::Rows { message, .. } => message,
            QueryResult::Message(message) => message,
        }
    }

    /// Result columns (empty for messages)
    pub fn columns(&self) -> &[ColumnMeta] {
        match self {
            QueryResult::Rows { columns, .. } => columns,
            QueryResult::Message(_) => &[],
        }
    }

    /// Result rows (empty for messages)
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows { rows, .. } => rows,
            QueryResult::Message(_) => &[],
        }
    }

    /// Cell values laid out in column order
    pub fn values(&self) -> Vec<Vec<Value>> {
        let columns = self.columns();
        self.rows()
            .iter()
            .map(|row| columns.iter().map(|c| row.get(c.id).clone()).collect())
            .collect()
    }
}

/// Result plus the notification a successful mutation should emit
#[derive(Debug, Clone)]
pub struct Outcome {
    pub result: QueryResult,
    pub notice: Option<ChangeNotice>,
}

impl Outcome {
    fn message(message: impl Into<String>) -> Self {
        Self {
            result: QueryResult::Message(message.into()),
            notice: None,
        }
    }

    fn rows(columns: Vec<ColumnMeta>, rows: Vec<Row>, message: impl Into<String>) -> Self {
        Self {
            result: QueryResult::Rows {
                columns,
                rows,
                message: message.into(),
            },
            notice: None,
        }
    }

    fn notify(mut self, notice: ChangeNotice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Executes commands against a working copy of the collection
pub struct Executor<'a> {
    set: &'a mut DatabaseSet,
    active: &'a mut Option<DatabaseId>,
}

impl<'a> Executor<'a> {
    /// Create an executor over a working copy and the caller's selection
    pub fn new(set: &'a mut DatabaseSet, active: &'a mut Option<DatabaseId>) -> Self {
        Self { set, active }
    }

    /// Execute a single command
    pub fn execute(&mut self, command: &Command) -> Result<Outcome> {
        debug!("Executing {}", command.keyword());

        match command {
            Command::Select(select) => self.select(select),
            Command::Insert(insert) => self.insert(insert),
            Command::Update(update) => self.update(update),
            Command::Delete(delete) => self.delete(delete),
            Command::CreateTable(create) => self.create_table(create),
            Command::CreateDatabase {
                name,
                if_not_exists,
            } => self.create_database(name, *if_not_exists),
            Command::DropTable { name } => self.drop_table(name),
            Command::DropDatabase { name } => self.drop_database(name),
            Command::AlterTable(alter) => self.alter_table(alter),
            Command::Use { name } => self.use_database(name),
            Command::Grant(permission) => self.record_permission(GrantAction::Grant, permission),
            Command::Revoke(permission) => self.record_permission(GrantAction::Revoke, permission),
            Command::ShowDatabases => Ok(self.show_databases()),
            Command::ShowTables => self.show_tables(),
            Command::Describe { table } => self.describe(table),
        }
    }

    // ========== Lookup helpers ==========

    /// Database id of the active selection, if it still exists
    pub fn active_id(&self) -> Result<DatabaseId> {
        self.active
            .filter(|id| self.set.contains(*id))
            .ok_or(Error::NoActiveDatabase)
    }

    fn active_database(&self) -> Result<&Database> {
        let id = self.active_id()?;
        self.set.get(id).ok_or(Error::NoActiveDatabase)
    }

    fn active_database_mut(&mut self) -> Result<&mut Database> {
        let id = self.active_id()?;
        self.set.get_mut(id).ok_or(Error::NoActiveDatabase)
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.active_database()?
            .table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Table in the active database, for mutation
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.active_database_mut()?
            .table_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Notice carrying the active database's current state
    pub fn active_notice(&self, change: DataChange) -> Result<ChangeNotice> {
        Ok(ChangeNotice::new(self.active_database()?.clone(), change))
    }

    // ========== Data statements ==========

    fn select(&self, select: &SelectStatement) -> Result<Outcome> {
        let table = self.table(&select.table)?;

        let columns: Vec<ColumnMeta> = match &select.projection {
            Projection::All => table.columns.clone(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| {
                    table
                        .column(name)
                        .cloned()
                        .ok_or_else(|| Error::ColumnNotFound(name.clone()))
                })
                .collect::<Result<_>>()?,
        };

        let rows = match &select.condition {
            Some(condition) => filter_rows(table, &table.rows, condition)?,
            None => table.rows.clone(),
        };
        let rows: Vec<Row> = rows.into_iter().map(|row| project(row, &columns)).collect();

        let message = format!("{} row(s) returned", rows.len());
        Ok(Outcome::rows(columns, rows, message))
    }

    fn insert(&mut self, insert: &InsertStatement) -> Result<Outcome> {
        if insert.columns.len() != insert.values.len() {
            return Err(Error::InvalidSyntax(format!(
                "INSERT names {} column(s) but supplies {} value(s)",
                insert.columns.len(),
                insert.values.len()
            )));
        }

        let table = self.table_mut(&insert.table)?;
        let mut cells = BTreeMap::new();
        for (name, raw) in insert.columns.iter().zip(&insert.values) {
            let column = table
                .column(name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
            cells.insert(column.id, Value::from_literal(raw));
        }
        let row_id = table.insert_row(cells);
        debug!("Inserted row {} into {}", row_id, table.name);

        let notice = self.active_notice(DataChange::RowsChanged)?;
        Ok(Outcome::message(format!("1 row inserted (id {})", row_id)).notify(notice))
    }

    fn update(&mut self, update: &UpdateStatement) -> Result<Outcome> {
        let table = self.table_mut(&update.table)?;

        let assignments: Vec<(ColumnId, Value)> = update
            .assignments
            .iter()
            .map(|a| {
                table
                    .column(&a.column)
                    .map(|c| (c.id, Value::from_literal(&a.value)))
                    .ok_or_else(|| Error::ColumnNotFound(a.column.clone()))
            })
            .collect::<Result<_>>()?;

        let ids = matching_row_ids(table, update.condition.as_deref())?;
        for id in &ids {
            if let Some(row) = table.row_mut(*id) {
                for (column, value) in &assignments {
                    row.set(*column, value.clone());
                }
            }
        }

        let notice = self.active_notice(DataChange::RowsChanged)?;
        Ok(Outcome::message(format!("{} row(s) updated", ids.len())).notify(notice))
    }

    fn delete(&mut self, delete: &DeleteStatement) -> Result<Outcome> {
        let table = self.table_mut(&delete.table)?;
        let ids = matching_row_ids(table, delete.condition.as_deref())?;
        let removed = table.remove_rows(&ids);

        let notice = self.active_notice(DataChange::RowsChanged)?;
        Ok(Outcome::message(format!("{} row(s) deleted", removed)).notify(notice))
    }

    // ========== Schema statements ==========

    fn create_table(&mut self, create: &CreateTableStatement) -> Result<Outcome> {
        let database = self.active_database_mut()?;
        if database.has_table(&create.name) {
            return Err(Error::TableAlreadyExists(create.name.clone()));
        }

        let mut table = Table::new(create.name.as_str());
        for def in &create.columns {
            let table_level_key = create.primary_key.iter().any(|k| k.eq_ignore_ascii_case(&def.name));
            add_column(&mut table, def, table_level_key)?;
        }
        if let Some(missing) = create.primary_key.iter().find(|k| table.column(k).is_none()) {
            return Err(Error::ColumnNotFound(missing.clone()));
        }

        info!(
            "Created table {} with {} column(s) in {}",
            table.name,
            table.columns.len(),
            database.name
        );
        database.tables.push(table);

        let notice = self.active_notice(DataChange::TablesChanged)?;
        Ok(Outcome::message(format!("Table '{}' created", create.name)).notify(notice))
    }

    fn create_database(&mut self, name: &str, if_not_exists: bool) -> Result<Outcome> {
        if let Some(existing) = self.set.find_by_name(name) {
            if if_not_exists {
                warn!("Database {} already exists, skipping", existing.name);
                return Ok(Outcome::message(format!(
                    "Database '{}' already exists",
                    existing.name
                )));
            }
            return Err(Error::DatabaseAlreadyExists(name.to_string()));
        }

        let database = Database::new(name);
        let id = database.id;
        self.set.push(database.clone());
        *self.active = Some(id);
        info!("Created database {} ({})", name, id);

        Ok(Outcome::message(format!("Database '{}' created", name))
            .notify(ChangeNotice::new(database, DataChange::DatabaseCreated)))
    }

    fn drop_table(&mut self, name: &str) -> Result<Outcome> {
        let database = self.active_database_mut()?;
        let table = database
            .remove_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        info!("Dropped table {} from {}", table.name, database.name);

        let notice = self.active_notice(DataChange::TablesChanged)?;
        Ok(Outcome::message(format!("Table '{}' dropped", table.name)).notify(notice))
    }

    fn drop_database(&mut self, name: &str) -> Result<Outcome> {
        let id = self
            .set
            .find_by_name(name)
            .map(|d| d.id)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))?;
        let database = self
            .set
            .remove(id)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))?;

        if *self.active == Some(id) {
            *self.active = None;
        }
        info!("Dropped database {} ({})", database.name, id);

        let message = format!("Database '{}' dropped", database.name);
        Ok(Outcome::message(message)
            .notify(ChangeNotice::new(database, DataChange::DatabaseDropped)))
    }

    fn alter_table(&mut self, alter: &AlterTableStatement) -> Result<Outcome> {
        let message = match &alter.action {
            AlterAction::AddColumn(def) => {
                let table = self.table_mut(&alter.table)?;
                add_column(table, def, false)?;
                format!("Column '{}' added to '{}'", def.name, table.name)
            }
            AlterAction::DropColumn(name) => {
                let table = self.table_mut(&alter.table)?;
                let id = table
                    .column(name)
                    .map(|c| c.id)
                    .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
                table.remove_column(id);
                format!("Column '{}' dropped from '{}'", name, table.name)
            }
            AlterAction::RenameTo(new_name) => {
                let database = self.active_database_mut()?;
                let taken = database
                    .tables
                    .iter()
                    .any(|t| t.is_named(new_name) && !t.is_named(&alter.table));
                if taken {
                    return Err(Error::TableAlreadyExists(new_name.clone()));
                }
                let table = database
                    .table_mut(&alter.table)
                    .ok_or_else(|| Error::TableNotFound(alter.table.clone()))?;
                let old_name = std::mem::replace(&mut table.name, new_name.clone());
                format!("Table '{}' renamed to '{}'", old_name, new_name)
            }
        };
        info!("{}", message);

        let notice = self.active_notice(DataChange::TablesChanged)?;
        Ok(Outcome::message(message).notify(notice))
    }

    fn use_database(&mut self, name: &str) -> Result<Outcome> {
        let database = self
            .set
            .find_by_name(name)
            .ok_or_else(|| Error::DatabaseNotFound(name.to_string()))?;
        *self.active = Some(database.id);
        Ok(Outcome::message(format!("Using database '{}'", database.name)))
    }

    fn record_permission(
        &mut self,
        action: GrantAction,
        permission: &PermissionStatement,
    ) -> Result<Outcome> {
        let event = PermissionEvent {
            action,
            privilege: permission.privilege.clone(),
            scope: permission.scope,
            name: permission.name.clone(),
            user: permission.user.clone(),
            timestamp: Utc::now(),
        };
        let message = format!(
            "{} {} ON {} {} {} {} recorded",
            action,
            event.privilege,
            event.scope,
            event.name,
            match action {
                GrantAction::Grant => "TO",
                GrantAction::Revoke => "FROM",
            },
            event.user
        );

        self.active_database_mut()?.meta.permissions.push(event);
        let notice = self.active_notice(DataChange::PermissionsChanged)?;
        Ok(Outcome::message(message).notify(notice))
    }

    // ========== Introspection ==========

    fn show_databases(&self) -> Outcome {
        let columns = vec![
            result_column(1, "database", BaseType::Text),
            result_column(2, "tables", BaseType::Number),
        ];
        let rows: Vec<Row> = self
            .set
            .iter()
            .enumerate()
            .map(|(i, db)| {
                result_row(
                    i,
                    [Value::from(db.name.as_str()), Value::from(db.tables.len() as i64)],
                )
            })
            .collect();
        let message = format!("{} database(s)", rows.len());
        Outcome::rows(columns, rows, message)
    }

    fn show_tables(&self) -> Result<Outcome> {
        let database = self.active_database()?;
        let columns = vec![
            result_column(1, "table", BaseType::Text),
            result_column(2, "columns", BaseType::Number),
            result_column(3, "rows", BaseType::Number),
        ];
        let rows: Vec<Row> = database
            .tables
            .iter()
            .enumerate()
            .map(|(i, t)| {
                result_row(
                    i,
                    [
                        Value::from(t.name.as_str()),
                        Value::from(t.columns.len() as i64),
                        Value::from(t.rows.len() as i64),
                    ],
                )
            })
            .collect();
        let message = format!("{} table(s) in '{}'", rows.len(), database.name);
        Ok(Outcome::rows(columns, rows, message))
    }

    fn describe(&self, name: &str) -> Result<Outcome> {
        let table = self.table(name)?;
        let columns = vec![
            result_column(1, "column", BaseType::Text),
            result_column(2, "type", BaseType::Text),
            result_column(3, "base_type", BaseType::Text),
            result_column(4, "primary_key", BaseType::Boolean),
        ];
        let rows: Vec<Row> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                result_row(
                    i,
                    [
                        Value::from(c.name.as_str()),
                        Value::from(c.original_type.as_str()),
                        Value::from(c.base_type.to_string()),
                        Value::Boolean(c.is_primary_key),
                    ],
                )
            })
            .collect();
        let message = format!("{} column(s) in '{}'", rows.len(), table.name);
        Ok(Outcome::rows(columns, rows, message))
    }
}

/// Validate and append a column definition
fn add_column(table: &mut Table, def: &ColumnDef, primary_key: bool) -> Result<ColumnId> {
    if table.column(&def.name).is_some() {
        return Err(Error::DuplicateColumnName(def.name.clone()));
    }
    let sql_type =
        parse_type(&def.type_text).ok_or_else(|| Error::InvalidType(def.type_text.clone()))?;
    Ok(table.add_column(def.name.as_str(), &sql_type, def.primary_key || primary_key))
}

/// Keep only the cells of the selected columns
fn project(row: Row, columns: &[ColumnMeta]) -> Row {
    let cells = columns
        .iter()
        .filter_map(|c| row.cells.get(&c.id).map(|v| (c.id, v.clone())))
        .collect();
    Row { id: row.id, cells }
}

fn result_column(id: u64, name: &str, base_type: BaseType) -> Column {
    Column {
        id: ColumnId::from_internal(id),
        name: name.to_string(),
        base_type,
        original_type: base_type.to_string(),
        length: None,
        precision: None,
        scale: None,
        is_primary_key: false,
    }
}

fn result_row<const N: usize>(index: usize, values: [Value; N]) -> Row {
    let mut row = Row::new(RowId::from_internal(index as u64 + 1));
    for (i, value) in values.into_iter().enumerate() {
        row.set(ColumnId::from_internal(i as u64 + 1), value);
    }
    row
}
