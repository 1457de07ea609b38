//! Storage configuration options

use std::path::PathBuf;

/// Options for configuring the on-disk stores
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Path to the data directory
    pub path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    pub create_if_missing: bool,

    /// Pretty-print JSON files
    pub pretty: bool,

    /// Fsync files before they replace the previous version
    pub sync_on_write: bool,

    /// Maximum number of snapshots kept; the oldest are discarded first
    pub snapshot_limit: Option<usize>,
}

impl StorageOptions {
    /// Create options for a data directory at the given path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create options optimized for development/testing
    pub fn for_testing<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            pretty: false,
            sync_on_write: false, // Faster for tests
            snapshot_limit: None,
        }
    }

    /// Create options optimized for production
    pub fn for_production<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            pretty: false,
            sync_on_write: true,
            snapshot_limit: Some(256),
        }
    }

    /// Enable or disable pretty-printed JSON
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable or disable fsync on write
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Bound the snapshot stack depth
    pub fn snapshot_limit(mut self, limit: Option<usize>) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// Enable or disable directory creation
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
            create_if_missing: true,
            pretty: true,
            sync_on_write: false,
            snapshot_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = StorageOptions::default();
        assert!(opts.create_if_missing);
        assert!(opts.pretty);
        assert!(opts.snapshot_limit.is_none());
    }

    #[test]
    fn test_testing_options() {
        let opts = StorageOptions::for_testing("/tmp/test");
        assert!(!opts.sync_on_write);
        assert!(!opts.pretty);
    }

    #[test]
    fn test_production_options() {
        let opts = StorageOptions::for_production("/var/lib/tabula");
        assert!(opts.sync_on_write);
        assert_eq!(opts.snapshot_limit, Some(256));
    }

    #[test]
    fn test_builder_pattern() {
        let opts = StorageOptions::new("/data")
            .pretty(false)
            .sync_on_write(true)
            .snapshot_limit(Some(8));

        assert!(!opts.pretty);
        assert!(opts.sync_on_write);
        assert_eq!(opts.snapshot_limit, Some(8));
    }
}
