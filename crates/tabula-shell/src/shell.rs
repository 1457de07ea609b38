//! Line-oriented shell over a [`Session`]

use crate::config::{Backend, ShellConfig};
use crate::render::render;
use std::sync::Arc;
use tabula_core::{Error, Result};
use tabula_query::{Interpreter, InterpreterOptions, Session};
use tabula_storage::{
    JsonFileStore, JsonSnapshotStack, MemorySnapshotStack, MemoryStore, SnapshotStack, Store,
};
use tracing::{debug, info, warn};

/// Session over whichever backend the configuration picked
pub type ShellSession = Session<Arc<dyn Store>, Arc<dyn SnapshotStack>>;

const HELP: &str = "\
Statements end with ';' or a blank line.

Meta commands:
  .help                         Show this text
  .quit                         Leave the shell
  .databases                    List databases
  .tables                       List tables in the active database
  .insert <table> col=value ... Insert a row with type coercion";

/// What a line of input produced
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The statement is not complete yet
    Pending,
    /// Text to show the user
    Output(String),
    /// Leave the shell
    Quit,
}

/// Accumulates input lines into complete statements
#[derive(Debug, Default)]
pub struct StatementBuffer {
    lines: Vec<String>,
}

impl StatementBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line, returning the statement once it is complete
    ///
    /// A statement ends at a line whose last character is `;` or at a blank
    /// line.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return self.flush();
        }
        self.lines.push(line.trim_end().to_string());
        if trimmed.ends_with(';') {
            self.flush()
        } else {
            None
        }
    }

    /// Take whatever has been buffered
    pub fn flush(&mut self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        let statement = self.lines.join("\n");
        self.lines.clear();
        Some(statement)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Interactive shell state
pub struct Shell {
    config: ShellConfig,
    session: ShellSession,
    buffer: StatementBuffer,
}

impl Shell {
    /// Open the configured backend and start a session
    pub fn open(config: ShellConfig) -> Result<Self> {
        info!("Opening {:?} backend", config.backend);
        let (store, snapshots) = open_backend(&config)?;

        let options = InterpreterOptions::new().transaction_mode(config.transaction_mode);
        let mut session = Session::new(Interpreter::with_options(store, snapshots, options));

        if let Some(name) = &config.initial_database {
            match session.select(name) {
                Ok(()) => info!("Selected database '{}'", name),
                Err(e) => warn!("Initial database '{}' unavailable: {}", name, e),
            }
        }

        Ok(Self {
            config,
            session,
            buffer: StatementBuffer::new(),
        })
    }

    /// Shell version
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn session(&self) -> &ShellSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ShellSession {
        &mut self.session
    }

    /// Prompt text, showing the active database or a continuation marker
    pub fn prompt(&self) -> String {
        if !self.buffer.is_empty() {
            return format!("{}...> ", " ".repeat(self.config.prompt.len()));
        }
        match self.session.active_name() {
            Ok(Some(name)) => format!("{}({})> ", self.config.prompt, name),
            _ => format!("{}> ", self.config.prompt),
        }
    }

    /// Feed one line of input
    pub fn handle_line(&mut self, line: &str) -> Result<Step> {
        let trimmed = line.trim();
        if self.buffer.is_empty() && trimmed.starts_with('.') {
            return self.meta(trimmed);
        }
        match self.buffer.push(line) {
            Some(statement) => self.run(&statement).map(Step::Output),
            None => Ok(Step::Pending),
        }
    }

    /// Run whatever is left in the buffer, at end of input
    pub fn finish(&mut self) -> Result<Option<String>> {
        match self.buffer.flush() {
            Some(statement) => self.run(&statement).map(Some),
            None => Ok(None),
        }
    }

    /// Execute one complete statement and render its result
    pub fn run(&mut self, statement: &str) -> Result<String> {
        debug!("Executing: {}", statement);
        let result = self.session.execute(statement)?;
        Ok(render(&result))
    }

    fn meta(&mut self, line: &str) -> Result<Step> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();

        match command.as_str() {
            ".help" => Ok(Step::Output(HELP.to_string())),
            ".quit" | ".exit" => Ok(Step::Quit),
            ".databases" => self.run("SHOW DATABASES").map(Step::Output),
            ".tables" => self.run("SHOW TABLES").map(Step::Output),
            ".insert" => {
                let table = words.next().ok_or_else(|| {
                    Error::InvalidSyntax("Expected .insert <table> col=value ...".to_string())
                })?;
                let values = words
                    .map(|pair| {
                        pair.split_once('=')
                            .map(|(column, value)| (column.to_string(), value.to_string()))
                            .ok_or_else(|| {
                                Error::InvalidSyntax(format!("Expected col=value, got '{}'", pair))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let id = self.session.insert_row(table, values.as_slice())?;
                Ok(Step::Output(format!("1 row inserted (id {})", id)))
            }
            other => Err(Error::InvalidSyntax(format!(
                "Unknown command '{}'. Try .help",
                other
            ))),
        }
    }
}

fn open_backend(config: &ShellConfig) -> Result<(Arc<dyn Store>, Arc<dyn SnapshotStack>)> {
    match config.backend {
        Backend::Memory => {
            let snapshots = match config.snapshot_limit {
                Some(limit) => MemorySnapshotStack::with_limit(limit),
                None => MemorySnapshotStack::new(),
            };
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            let snapshots: Arc<dyn SnapshotStack> = Arc::new(snapshots);
            Ok((store, snapshots))
        }
        Backend::Json => {
            let options = config.storage_options();
            let store: Arc<dyn Store> = Arc::new(JsonFileStore::open(options.clone())?);
            let snapshots: Arc<dyn SnapshotStack> = Arc::new(JsonSnapshotStack::open(options)?);
            Ok((store, snapshots))
        }
        Backend::RocksDb => open_rocks(config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocks(config: &ShellConfig) -> Result<(Arc<dyn Store>, Arc<dyn SnapshotStack>)> {
    let engine = Arc::new(tabula_storage::RocksStore::open(config.storage_options())?);
    let store: Arc<dyn Store> = engine.clone();
    let snapshots: Arc<dyn SnapshotStack> = engine;
    Ok((store, snapshots))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocks(_config: &ShellConfig) -> Result<(Arc<dyn Store>, Arc<dyn SnapshotStack>)> {
    Err(Error::Configuration(
        "RocksDB backend not compiled in; rebuild with --features rocksdb".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_query::TransactionMode;
    use tempfile::TempDir;

    fn memory_shell() -> Shell {
        Shell::open(ShellConfig::in_memory()).unwrap()
    }

    fn output(step: Step) -> String {
        match step {
            Step::Output(text) => text,
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn test_buffer_ends_on_semicolon() {
        let mut buffer = StatementBuffer::new();
        assert_eq!(buffer.push("SELECT *"), None);
        assert_eq!(buffer.push("FROM t;"), Some("SELECT *\nFROM t;".to_string()));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_ends_on_blank_line() {
        let mut buffer = StatementBuffer::new();
        assert_eq!(buffer.push("   "), None);
        assert_eq!(buffer.push("BEGIN"), None);
        assert_eq!(buffer.push(""), Some("BEGIN".to_string()));
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn test_multi_line_statement() {
        let mut shell = memory_shell();
        assert_eq!(
            shell.handle_line("CREATE DATABASE shop;").unwrap(),
            Step::Output("Database 'shop' created".into())
        );
        assert_eq!(shell.handle_line("CREATE TABLE items (").unwrap(), Step::Pending);
        assert!(shell.prompt().ends_with("...> "));
        assert_eq!(
            shell.handle_line("  id INT PRIMARY KEY, name TEXT)").unwrap(),
            Step::Pending
        );
        let created = output(shell.handle_line("").unwrap());
        assert_eq!(created, "Table 'items' created");
        assert_eq!(shell.prompt(), "tabula(shop)> ");
    }

    #[test]
    fn test_select_is_rendered() {
        let mut shell = memory_shell();
        shell.run("CREATE DATABASE d").unwrap();
        shell.run("CREATE TABLE t (id INT, name TEXT)").unwrap();
        shell.run("INSERT INTO t (id, name) VALUES (1, 'alice')").unwrap();

        let out = shell.run("SELECT * FROM t").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id | name");
        assert_eq!(lines[2], "1  | alice");
        assert_eq!(lines[3], "1 row(s) returned");
    }

    #[test]
    fn test_meta_commands() {
        let mut shell = memory_shell();
        assert!(output(shell.handle_line(".help").unwrap()).contains(".insert"));
        assert_eq!(shell.handle_line(".QUIT").unwrap(), Step::Quit);
        assert!(shell.handle_line(".bogus").unwrap_err().is_syntax());
        assert!(matches!(
            shell.handle_line(".tables").unwrap_err(),
            Error::NoActiveDatabase
        ));

        shell.run("CREATE DATABASE d").unwrap();
        shell.run("CREATE TABLE t (code VARCHAR(3), qty INT)").unwrap();
        assert!(output(shell.handle_line(".databases").unwrap()).contains("d "));
        assert!(output(shell.handle_line(".tables").unwrap()).starts_with("table"));

        let inserted = output(shell.handle_line(".insert t code=ABCDEF qty=7").unwrap());
        assert!(inserted.starts_with("1 row inserted"));
        let out = shell.run("SELECT code FROM t").unwrap();
        assert_eq!(out.lines().nth(2), Some("ABC"));

        assert!(shell.handle_line(".insert t code").unwrap_err().is_syntax());
        assert!(shell.handle_line(".insert").unwrap_err().is_syntax());
    }

    #[test]
    fn test_finish_runs_trailing_statement() {
        let mut shell = memory_shell();
        assert_eq!(shell.handle_line("CREATE DATABASE tail").unwrap(), Step::Pending);
        assert_eq!(shell.finish().unwrap().as_deref(), Some("Database 'tail' created"));
        assert_eq!(shell.finish().unwrap(), None);
    }

    #[test]
    fn test_json_backend_persists_across_shells() {
        let dir = TempDir::new().unwrap();
        let config = ShellConfig::new(dir.path()).transaction_mode(TransactionMode::Scoped);

        {
            let mut shell = Shell::open(config.clone()).unwrap();
            shell.run("CREATE DATABASE kept").unwrap();
            shell.run("CREATE TABLE t (x INT)").unwrap();
        }

        let mut config = config;
        config.initial_database = Some("kept".to_string());
        let mut shell = Shell::open(config).unwrap();
        assert_eq!(shell.prompt(), "tabula(kept)> ");
        assert!(shell.run("SHOW TABLES").unwrap().contains("t "));
    }

    #[test]
    fn test_missing_initial_database_is_not_fatal() {
        let mut config = ShellConfig::in_memory();
        config.initial_database = Some("ghost".to_string());
        let shell = Shell::open(config).unwrap();
        assert_eq!(shell.prompt(), "tabula> ");
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_rocksdb_requires_feature() {
        let config = ShellConfig::in_memory().backend(Backend::RocksDb);
        assert!(matches!(Shell::open(config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_version() {
        assert!(!Shell::version().is_empty());
    }
}
