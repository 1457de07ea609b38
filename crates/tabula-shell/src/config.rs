//! Shell configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tabula_core::{Error, Result};
use tabula_query::TransactionMode;
use tabula_storage::StorageOptions;

/// Where the shell keeps its data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Nothing survives the process
    Memory,
    /// `databases.json` and `snapshots.json` in the data directory
    #[default]
    Json,
    /// RocksDB in the data directory (requires the `rocksdb` feature)
    RocksDb,
}

/// Shell configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Data directory
    pub data_dir: PathBuf,

    /// Storage backend
    pub backend: Backend,

    /// Snapshot policy
    pub transaction_mode: TransactionMode,

    /// Maximum snapshots kept (unbounded if unset)
    pub snapshot_limit: Option<usize>,

    /// Pretty-print JSON data files
    pub pretty: bool,

    /// Fsync data files on every write
    pub sync_on_write: bool,

    /// Log level
    pub log_level: String,

    /// Prompt prefix, followed by the active database name
    pub prompt: String,

    /// Database selected at startup
    pub initial_database: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            backend: Backend::Json,
            transaction_mode: TransactionMode::Literal,
            snapshot_limit: None,
            pretty: false,
            sync_on_write: true,
            log_level: "info".to_string(),
            prompt: "tabula".to_string(),
            initial_database: None,
        }
    }
}

impl ShellConfig {
    /// Create a new configuration
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Create configuration for an in-memory session
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Default::default()
        }
    }

    /// Create configuration for development
    pub fn for_development<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
            log_level: "debug".to_string(),
            pretty: true,
            sync_on_write: false,
            ..Default::default()
        }
    }

    /// Load a JSON configuration file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))
    }

    /// Storage options derived from this configuration
    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions::new(&self.data_dir)
            .pretty(self.pretty)
            .sync_on_write(self.sync_on_write)
            .snapshot_limit(self.snapshot_limit)
    }

    /// Builder: set backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Builder: set transaction mode
    pub fn transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.transaction_mode = mode;
        self
    }

    /// Builder: set data directory
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Builder: set log level
    pub fn log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }
}
