//! Tabula Query Engine
//!
//! Parses and executes the restricted SQL dialect against a
//! [`tabula_core::DatabaseSet`].
//!
//! # Overview
//!
//! A statement flows through:
//! - `lexer` - logos tokens with source spans
//! - `parser` - one closed [`Statement`] per text
//! - `executor` - schema validation and mutation of a working copy
//! - `predicate` and `coercion` - WHERE evaluation and typed values
//! - `transaction` - snapshot policy around mutations
//! - `interpreter` - the dispatcher tying it together with a store

pub mod coercion;
pub mod editor;
pub mod executor;
pub mod interpreter;
pub mod lexer;
pub mod notify;
pub mod parser;
pub mod predicate;
pub mod session;
pub mod transaction;

pub use coercion::{coerce, parse_type};
pub use executor::{Executor, Outcome, QueryResult};
pub use interpreter::{Interpreter, InterpreterOptions};
pub use lexer::{tokenize, Token};
pub use notify::{ChangeNotice, DataChange, DataChangeListener};
pub use parser::{parse, Command, Statement, TransactionControl};
pub use predicate::{filter_rows, CompareOp, Condition};
pub use session::Session;
pub use transaction::{RollbackOutcome, TransactionManager, TransactionMode};

// Type alias for lexer (uses logos::Lexer)
pub type SqlLexer<'a> = logos::Lexer<'a, Token>;
