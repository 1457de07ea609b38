//! Statement parser
//!
//! Turns one statement of text into a [`Statement`]. The dispatcher matches
//! the result exhaustively, so adding a statement kind means adding a
//! variant here.
//!
//! Literal positions (VALUES entries, SET right-hand sides, WHERE
//! conditions, type declarations) are kept as raw source slices. Their
//! interpretation belongs to the predicate evaluator and type coercion.

use crate::lexer::{tokenize_spanned, Spanned, Token};
use tabula_core::{Error, PermissionScope, Result};

/// Statement kinds accepted by [`parse`], listed in errors
pub const SUPPORTED_STATEMENTS: &[&str] = &[
    "SELECT",
    "INSERT",
    "UPDATE",
    "DELETE",
    "CREATE TABLE",
    "CREATE DATABASE",
    "DROP TABLE",
    "DROP DATABASE",
    "ALTER TABLE",
    "USE",
    "GRANT",
    "REVOKE",
    "SHOW DATABASES",
    "SHOW TABLES",
    "DESCRIBE",
    "BEGIN",
    "COMMIT",
    "ROLLBACK",
];

// ========== AST ==========

/// A parsed statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Transaction control, handled by the transaction manager
    Control(TransactionControl),
    /// Anything that reads or changes the database collection
    Command(Command),
}

/// BEGIN / COMMIT / ROLLBACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionControl {
    Begin,
    Commit,
    Rollback,
}

/// Data and schema statements
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateTable(CreateTableStatement),
    CreateDatabase { name: String, if_not_exists: bool },
    DropTable { name: String },
    DropDatabase { name: String },
    AlterTable(AlterTableStatement),
    Use { name: String },
    Grant(PermissionStatement),
    Revoke(PermissionStatement),
    ShowDatabases,
    ShowTables,
    Describe { table: String },
}

impl Command {
    /// Whether executing this command can change the collection
    pub fn is_mutating(&self) -> bool {
        match self {
            Command::Insert(_)
            | Command::Update(_)
            | Command::Delete(_)
            | Command::CreateTable(_)
            | Command::CreateDatabase { .. }
            | Command::DropTable { .. }
            | Command::DropDatabase { .. }
            | Command::AlterTable(_)
            | Command::Grant(_)
            | Command::Revoke(_) => true,
            Command::Select(_)
            | Command::Use { .. }
            | Command::ShowDatabases
            | Command::ShowTables
            | Command::Describe { .. } => false,
        }
    }

    /// Statement keyword, for logging
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Select(_) => "SELECT",
            Command::Insert(_) => "INSERT",
            Command::Update(_) => "UPDATE",
            Command::Delete(_) => "DELETE",
            Command::CreateTable(_) => "CREATE TABLE",
            Command::CreateDatabase { .. } => "CREATE DATABASE",
            Command::DropTable { .. } => "DROP TABLE",
            Command::DropDatabase { .. } => "DROP DATABASE",
            Command::AlterTable(_) => "ALTER TABLE",
            Command::Use { .. } => "USE",
            Command::Grant(_) => "GRANT",
            Command::Revoke(_) => "REVOKE",
            Command::ShowDatabases => "SHOW DATABASES",
            Command::ShowTables => "SHOW TABLES",
            Command::Describe { .. } => "DESCRIBE",
        }
    }
}

/// Projection list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub projection: Projection,
    pub table: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    /// Raw literal text per value
    pub values: Vec<String>,
}

/// `column = literal` in an UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub condition: Option<String>,
}

/// One column definition inside CREATE TABLE or ALTER TABLE ADD
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Declared type as written, e.g. `DECIMAL(10,2)`
    pub type_text: String,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Columns listed in a table-level `PRIMARY KEY (...)` clause
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub table: String,
    pub action: AlterAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(ColumnDef),
    DropColumn(String),
    RenameTo(String),
}

/// Body shared by GRANT and REVOKE
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionStatement {
    pub privilege: String,
    pub scope: PermissionScope,
    pub name: String,
    pub user: String,
}

// ========== Entry point ==========

/// Parse a single statement
///
/// Surrounding whitespace and one trailing `;` are ignored.
pub fn parse(text: &str) -> Result<Statement> {
    let text = normalize(text);
    if text.is_empty() {
        return Err(Error::EmptyStatement);
    }

    let mut parser = Parser::new(text);
    let statement = parser.parse_statement()?;
    parser.expect_end()?;
    Ok(statement)
}

/// Trim and strip trailing semicolons
pub fn normalize(text: &str) -> &str {
    text.trim().trim_end_matches(';').trim_end()
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    /// Shape description used in syntax errors
    usage: &'static str,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            tokens: tokenize_spanned(src),
            pos: 0,
            usage: "",
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let Some(first) = self.advance() else {
            return Err(Error::EmptyStatement);
        };

        let statement = match first.token {
            Token::Select => Statement::Command(Command::Select(self.parse_select()?)),
            Token::Insert => Statement::Command(Command::Insert(self.parse_insert()?)),
            Token::Update => Statement::Command(Command::Update(self.parse_update()?)),
            Token::Delete => Statement::Command(Command::Delete(self.parse_delete()?)),
            Token::Create => Statement::Command(self.parse_create()?),
            Token::Drop => Statement::Command(self.parse_drop()?),
            Token::Alter => Statement::Command(Command::AlterTable(self.parse_alter()?)),
            Token::Use => {
                self.usage = "USE <database>";
                Statement::Command(Command::Use {
                    name: self.expect_name()?,
                })
            }
            Token::Grant => Statement::Command(Command::Grant(self.parse_permission(true)?)),
            Token::Revoke => Statement::Command(Command::Revoke(self.parse_permission(false)?)),
            Token::Show => Statement::Command(self.parse_show()?),
            Token::Describe => {
                self.usage = "DESCRIBE <table>";
                Statement::Command(Command::Describe {
                    table: self.expect_name()?,
                })
            }
            Token::Begin => self.parse_control(TransactionControl::Begin),
            Token::Commit => self.parse_control(TransactionControl::Commit),
            Token::Rollback => self.parse_control(TransactionControl::Rollback),
            _ => {
                let word = self
                    .src
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_uppercase();
                return Err(Error::UnsupportedStatement {
                    statement: word,
                    supported: SUPPORTED_STATEMENTS.join(", "),
                });
            }
        };
        Ok(statement)
    }

    // ========== Statements ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.usage = "SELECT <columns>|* FROM <table> [WHERE <condition>]";

        let projection = if self.accept(&Token::Star) {
            Projection::All
        } else {
            let mut columns = vec![self.expect_name()?];
            while self.accept(&Token::Comma) {
                columns.push(self.expect_name()?);
            }
            Projection::Columns(columns)
        };

        self.expect(&Token::From)?;
        let table = self.expect_name()?;
        let condition = self.parse_where()?;

        Ok(SelectStatement {
            projection,
            table,
            condition,
        })
    }

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.usage = "INSERT INTO <table> (<columns>) VALUES (<values>)";

        self.expect(&Token::Into)?;
        let table = self.expect_name()?;

        self.expect(&Token::LParen)?;
        let mut columns = vec![self.expect_name()?];
        while self.accept(&Token::Comma) {
            columns.push(self.expect_name()?);
        }
        self.expect(&Token::RParen)?;

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let close = self.matching_paren()?;
        let values = self
            .split_top_level(self.pos, close)
            .into_iter()
            .map(|(start, end)| self.slice(start, end))
            .collect::<Result<Vec<_>>>()?;
        self.pos = close + 1;

        Ok(InsertStatement {
            table,
            columns,
            values,
        })
    }

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.usage = "UPDATE <table> SET <column> = <value>[, ...] [WHERE <condition>]";

        let table = self.expect_name()?;
        self.expect(&Token::Set)?;

        let end = self.find_top_level(&Token::Where).unwrap_or(self.tokens.len());
        let mut assignments = Vec::new();
        for (start, stop) in self.split_top_level(self.pos, end) {
            assignments.push(self.parse_assignment(start, stop)?);
        }
        self.pos = end;

        let condition = self.parse_where()?;
        Ok(UpdateStatement {
            table,
            assignments,
            condition,
        })
    }

    fn parse_assignment(&self, start: usize, end: usize) -> Result<Assignment> {
        if start >= end {
            return Err(self.syntax_error());
        }
        let column = self.tokens[start]
            .name(self.src)
            .ok_or_else(|| self.syntax_error())?;
        if start + 2 > end || self.tokens[start + 1].token != Token::Equals {
            return Err(self.syntax_error());
        }
        Ok(Assignment {
            column,
            value: self.slice(start + 2, end)?,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.usage = "DELETE FROM <table> [WHERE <condition>]";

        self.expect(&Token::From)?;
        let table = self.expect_name()?;
        let condition = self.parse_where()?;
        Ok(DeleteStatement { table, condition })
    }

    fn parse_create(&mut self) -> Result<Command> {
        self.usage = "CREATE TABLE <name> (<column definitions>) | CREATE DATABASE [IF NOT EXISTS] <name>";

        match self.advance().map(|t| t.token) {
            Some(Token::Table) => self.parse_create_table().map(Command::CreateTable),
            Some(Token::Database) => {
                self.usage = "CREATE DATABASE [IF NOT EXISTS] <name>";
                let if_not_exists = self.accept(&Token::If);
                if if_not_exists {
                    self.expect(&Token::Not)?;
                    self.expect(&Token::Exists)?;
                }
                Ok(Command::CreateDatabase {
                    name: self.expect_name()?,
                    if_not_exists,
                })
            }
            _ => Err(self.syntax_error()),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.usage = "CREATE TABLE <name> (<column> <type> [PRIMARY KEY], ...)";

        let name = self.expect_name()?;
        self.expect(&Token::LParen)?;
        let close = self.matching_paren()?;

        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        for (start, end) in self.split_top_level(self.pos, close) {
            if self.tokens[start].token == Token::Primary {
                primary_key.extend(self.parse_table_primary_key(start, end)?);
            } else {
                columns.push(self.parse_column_def(start, end)?);
            }
        }
        self.pos = close + 1;

        Ok(CreateTableStatement {
            name,
            columns,
            primary_key,
        })
    }

    /// `PRIMARY KEY (a, b)` between token indices
    fn parse_table_primary_key(&self, start: usize, end: usize) -> Result<Vec<String>> {
        let invalid = || Error::InvalidColumnDefinition(self.raw(start, end).to_string());
        let tokens = &self.tokens[start..end];
        if tokens.len() < 4
            || tokens[1].token != Token::Key
            || tokens[2].token != Token::LParen
            || tokens[tokens.len() - 1].token != Token::RParen
        {
            return Err(invalid());
        }

        let mut names = Vec::new();
        for (i, t) in tokens[3..tokens.len() - 1].iter().enumerate() {
            if i % 2 == 1 {
                if t.token != Token::Comma {
                    return Err(invalid());
                }
            } else {
                names.push(t.name(self.src).ok_or_else(invalid)?);
            }
        }
        if names.is_empty() {
            return Err(invalid());
        }
        Ok(names)
    }

    /// `<name> <type>[(args)] [constraints...]` between token indices
    fn parse_column_def(&self, start: usize, end: usize) -> Result<ColumnDef> {
        let definition = self.raw(start, end);
        let invalid = || Error::InvalidColumnDefinition(definition.to_string());
        if start >= end {
            return Err(invalid());
        }

        let name = self.tokens[start].name(self.src).ok_or_else(invalid)?;

        let type_start = start + 1;
        if type_start >= end || self.tokens[type_start].name(self.src).is_none() {
            return Err(invalid());
        }
        let mut type_end = type_start + 1;
        if type_end < end && self.tokens[type_end].token == Token::LParen {
            let close = (type_end..end)
                .find(|&i| self.tokens[i].token == Token::RParen)
                .ok_or_else(invalid)?;
            type_end = close + 1;
        }

        let normalized = definition.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(ColumnDef {
            name,
            type_text: self.raw(type_start, type_end).to_string(),
            primary_key: normalized.to_uppercase().contains("PRIMARY KEY"),
        })
    }

    fn parse_drop(&mut self) -> Result<Command> {
        self.usage = "DROP TABLE <name> | DROP DATABASE <name>";

        match self.advance().map(|t| t.token) {
            Some(Token::Table) => Ok(Command::DropTable {
                name: self.expect_name()?,
            }),
            Some(Token::Database) => Ok(Command::DropDatabase {
                name: self.expect_name()?,
            }),
            _ => Err(self.syntax_error()),
        }
    }

    fn parse_alter(&mut self) -> Result<AlterTableStatement> {
        self.usage = "ALTER TABLE <name> ADD [COLUMN] <definition> | DROP [COLUMN] <column> | RENAME TO <new name>";

        self.expect(&Token::Table)?;
        let table = self.expect_name()?;

        let action = match self.advance().map(|t| t.token) {
            Some(Token::Add) => {
                self.accept(&Token::Column);
                let start = self.pos;
                let end = self.tokens.len();
                if start >= end {
                    return Err(self.syntax_error());
                }
                let def = self.parse_column_def(start, end)?;
                self.pos = end;
                AlterAction::AddColumn(def)
            }
            Some(Token::Drop) => {
                self.accept(&Token::Column);
                AlterAction::DropColumn(self.expect_name()?)
            }
            Some(Token::Rename) => {
                self.expect(&Token::To)?;
                AlterAction::RenameTo(self.expect_name()?)
            }
            _ => return Err(self.syntax_error()),
        };

        Ok(AlterTableStatement { table, action })
    }

    fn parse_permission(&mut self, grant: bool) -> Result<PermissionStatement> {
        self.usage = if grant {
            "GRANT <privilege> ON TABLE|DATABASE <name> TO <user>"
        } else {
            "REVOKE <privilege> ON TABLE|DATABASE <name> FROM <user>"
        };

        let on = self.find_top_level(&Token::On).ok_or_else(|| self.syntax_error())?;
        let privilege = self.slice(self.pos, on)?;
        self.pos = on + 1;

        let scope = match self.advance().map(|t| t.token) {
            Some(Token::Table) => PermissionScope::Table,
            Some(Token::Database) => PermissionScope::Database,
            _ => return Err(self.syntax_error()),
        };
        let name = self.expect_name()?;

        self.expect(if grant { &Token::To } else { &Token::From })?;
        let user = match self.advance() {
            Some(Spanned {
                token: Token::StringSingle(s) | Token::StringDouble(s),
                ..
            }) => s,
            Some(t) => t.name(self.src).ok_or_else(|| self.syntax_error())?,
            None => return Err(self.syntax_error()),
        };

        Ok(PermissionStatement {
            privilege,
            scope,
            name,
            user,
        })
    }

    fn parse_show(&mut self) -> Result<Command> {
        self.usage = "SHOW DATABASES | SHOW TABLES";

        match self.advance().map(|t| t.token) {
            Some(Token::Databases) => Ok(Command::ShowDatabases),
            Some(Token::Tables) => Ok(Command::ShowTables),
            _ => Err(self.syntax_error()),
        }
    }

    fn parse_control(&mut self, control: TransactionControl) -> Statement {
        self.accept(&Token::Transaction);
        Statement::Control(control)
    }

    /// Optional trailing `WHERE <condition>`, which must run to the end
    fn parse_where(&mut self) -> Result<Option<String>> {
        if !self.accept(&Token::Where) {
            return Ok(None);
        }
        let condition = self.slice(self.pos, self.tokens.len())?;
        self.pos = self.tokens.len();
        Ok(Some(condition))
    }

    // ========== Cursor helpers ==========

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn accept(&mut self, token: &Token) -> bool {
        if self.peek().is_some_and(|t| &t.token == token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.accept(token) {
            Ok(())
        } else {
            Err(self.syntax_error())
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        let name = self.peek().and_then(|t| t.name(self.src));
        match name {
            Some(name) => {
                self.pos += 1;
                Ok(name)
            }
            None => Err(self.syntax_error()),
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.syntax_error()),
        }
    }

    /// Index of the `)` closing the `(` just consumed
    fn matching_paren(&self) -> Result<usize> {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(self.pos) {
            match t.token {
                Token::LParen => depth += 1,
                Token::RParen if depth == 0 => return Ok(i),
                Token::RParen => depth -= 1,
                _ => {}
            }
        }
        Err(self.syntax_error())
    }

    /// First occurrence of `token` at parenthesis depth zero from the cursor
    fn find_top_level(&self, token: &Token) -> Option<usize> {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(self.pos) {
            match &t.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                t if depth == 0 && t == token => return Some(i),
                _ => {}
            }
        }
        None
    }

    /// Split `[start, end)` on commas at parenthesis depth zero
    ///
    /// Empty pieces are kept so callers can reject them.
    fn split_top_level(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut pieces = Vec::new();
        let mut depth = 0usize;
        let mut piece_start = start;
        for i in start..end {
            match self.tokens[i].token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Comma if depth == 0 => {
                    pieces.push((piece_start, i));
                    piece_start = i + 1;
                }
                _ => {}
            }
        }
        pieces.push((piece_start, end));
        pieces
    }

    /// Source text covering tokens `[start, end)`
    fn raw(&self, start: usize, end: usize) -> &'a str {
        if start >= end {
            return "";
        }
        &self.src[self.tokens[start].span.start..self.tokens[end - 1].span.end]
    }

    /// Like [`Self::raw`] but an empty range is a syntax error
    fn slice(&self, start: usize, end: usize) -> Result<String> {
        if start >= end {
            return Err(self.syntax_error());
        }
        Ok(self.raw(start, end).to_string())
    }

    fn syntax_error(&self) -> Error {
        let near = match self.peek() {
            Some(t) => format!(" near '{}'", &self.src[t.span.clone()]),
            None => " at end of statement".to_string(),
        };
        if self.usage.is_empty() {
            Error::InvalidSyntax(format!("Unexpected input{}", near))
        } else {
            Error::InvalidSyntax(format!("Expected {}{}", self.usage, near))
        }
    }
}
