//! Tabula Shell
//!
//! Interactive front end for the Tabula statement interpreter.
//!
//! # Features
//!
//! - Memory, JSON-file and (optionally) RocksDB backends
//! - Multi-line statement entry
//! - Aligned table output
//! - Meta commands for listing and coerced row entry

pub mod config;
pub mod render;
pub mod shell;

pub use config::{Backend, ShellConfig};
pub use render::{render, render_table};
pub use shell::{Shell, ShellSession, StatementBuffer, Step};
