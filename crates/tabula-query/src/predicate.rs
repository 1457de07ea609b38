//! WHERE clause evaluation
//!
//! Only a single `<column> <op> <literal>` comparison is understood.
//! Compound conditions are rejected rather than partially evaluated.

use crate::lexer::{tokenize_spanned, Token};
use std::cmp::Ordering;
use std::fmt;
use tabula_core::{ColumnId, Error, Result, Row, RowId, Table, Value};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Equals => Some(CompareOp::Eq),
            Token::NotEquals => Some(CompareOp::NotEq),
            Token::LessThan => Some(CompareOp::Lt),
            Token::LessEquals => Some(CompareOp::LtEq),
            Token::GreaterThan => Some(CompareOp::Gt),
            Token::GreaterEquals => Some(CompareOp::GtEq),
            _ => None,
        }
    }

    /// Apply the operator to a cell value and a literal
    pub fn evaluate(self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::Eq => left.loose_eq(right),
            CompareOp::NotEq => !left.loose_eq(right),
            CompareOp::Lt => matches!(left.loose_cmp(right), Some(Ordering::Less)),
            CompareOp::LtEq => matches!(
                left.loose_cmp(right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Gt => matches!(left.loose_cmp(right), Some(Ordering::Greater)),
            CompareOp::GtEq => matches!(
                left.loose_cmp(right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A parsed single comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub literal: Value,
}

/// A condition resolved against a table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCondition {
    pub column: ColumnId,
    pub op: CompareOp,
    pub literal: Value,
}

fn breaks_single_comparison(token: &Token) -> bool {
    token.is_comparison()
        || matches!(
            token,
            Token::And
                | Token::Or
                | Token::Not
                | Token::In
                | Token::Like
                | Token::Is
                | Token::Between
                | Token::LParen
                | Token::RParen
        )
}

impl Condition {
    /// Parse condition text such as `age >= 30` or `name = 'O''Brien'`
    pub fn parse(text: &str) -> Result<Condition> {
        let text = text.trim();
        let tokens = tokenize_spanned(text);

        let column = tokens
            .first()
            .and_then(|t| t.name(text))
            .ok_or_else(|| Error::InvalidCondition(format!("Expected a column name in '{}'", text)))?;

        let op = tokens
            .get(1)
            .and_then(|t| CompareOp::from_token(&t.token))
            .ok_or_else(|| {
                Error::InvalidCondition(format!("Expected a comparison operator in '{}'", text))
            })?;

        let literal_tokens = &tokens[2..];
        let (first, last) = match (literal_tokens.first(), literal_tokens.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(Error::InvalidCondition(format!(
                    "Expected a value after '{}' in '{}'",
                    op, text
                )));
            }
        };

        if literal_tokens.iter().any(|t| breaks_single_comparison(&t.token)) {
            return Err(Error::InvalidCondition(format!(
                "Only a single <column> <operator> <value> comparison is supported, got '{}'",
                text
            )));
        }

        Ok(Condition {
            column,
            op,
            literal: Value::from_literal(&text[first.span.start..last.span.end]),
        })
    }

    /// Resolve the column against a table (case-insensitive)
    pub fn bind(&self, table: &Table) -> Result<BoundCondition> {
        let column = table
            .column(&self.column)
            .ok_or_else(|| Error::ColumnNotFound(self.column.clone()))?;
        Ok(BoundCondition {
            column: column.id,
            op: self.op,
            literal: self.literal.clone(),
        })
    }
}

impl BoundCondition {
    /// Test one row
    pub fn matches(&self, row: &Row) -> bool {
        self.op.evaluate(row.get(self.column), &self.literal)
    }
}

/// Keep the rows satisfying a condition
pub fn filter_rows(table: &Table, rows: &[Row], condition: &str) -> Result<Vec<Row>> {
    let bound = Condition::parse(condition)?.bind(table)?;
    Ok(rows.iter().filter(|r| bound.matches(r)).cloned().collect())
}

/// Ids of the table's rows matching an optional condition, in table order
///
/// No condition selects every row.
pub fn matching_row_ids(table: &Table, condition: Option<&str>) -> Result<Vec<RowId>> {
    match condition {
        Some(text) => {
            let bound = Condition::parse(text)?.bind(table)?;
            Ok(table
                .rows
                .iter()
                .filter(|r| bound.matches(r))
                .map(|r| r.id)
                .collect())
        }
        None => Ok(table.rows.iter().map(|r| r.id).collect()),
    }
}
