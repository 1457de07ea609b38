//! SQL lexer using logos
//!
//! Tokens carry their byte span so parsers can hand raw literal text (WHERE
//! conditions, VALUES entries, type declarations) onward untouched.

use logos::Logos;
use std::ops::Range;

/// SQL tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Statement keywords
    #[token("SELECT", ignore(ascii_case))]
    Select,

    #[token("FROM", ignore(ascii_case))]
    From,

    #[token("WHERE", ignore(ascii_case))]
    Where,

    #[token("INSERT", ignore(ascii_case))]
    Insert,

    #[token("INTO", ignore(ascii_case))]
    Into,

    #[token("VALUES", ignore(ascii_case))]
    Values,

    #[token("UPDATE", ignore(ascii_case))]
    Update,

    #[token("SET", ignore(ascii_case))]
    Set,

    #[token("DELETE", ignore(ascii_case))]
    Delete,

    #[token("CREATE", ignore(ascii_case))]
    Create,

    #[token("DROP", ignore(ascii_case))]
    Drop,

    #[token("ALTER", ignore(ascii_case))]
    Alter,

    #[token("TABLE", ignore(ascii_case))]
    Table,

    #[token("DATABASE", ignore(ascii_case))]
    #[token("SCHEMA", ignore(ascii_case))]
    Database,

    #[token("USE", ignore(ascii_case))]
    Use,

    #[token("GRANT", ignore(ascii_case))]
    Grant,

    #[token("REVOKE", ignore(ascii_case))]
    Revoke,

    #[token("ON", ignore(ascii_case))]
    On,

    #[token("TO", ignore(ascii_case))]
    To,

    #[token("BEGIN", ignore(ascii_case))]
    Begin,

    #[token("COMMIT", ignore(ascii_case))]
    Commit,

    #[token("ROLLBACK", ignore(ascii_case))]
    Rollback,

    #[token("IF", ignore(ascii_case))]
    If,

    #[token("EXISTS", ignore(ascii_case))]
    Exists,

    #[token("PRIMARY", ignore(ascii_case))]
    Primary,

    // Soft keywords: also accepted wherever a name is expected
    #[token("TRANSACTION", ignore(ascii_case))]
    #[token("WORK", ignore(ascii_case))]
    Transaction,

    #[token("KEY", ignore(ascii_case))]
    Key,

    #[token("SHOW", ignore(ascii_case))]
    Show,

    #[token("TABLES", ignore(ascii_case))]
    Tables,

    #[token("DATABASES", ignore(ascii_case))]
    #[token("SCHEMAS", ignore(ascii_case))]
    Databases,

    #[token("DESCRIBE", ignore(ascii_case))]
    #[token("DESC", ignore(ascii_case))]
    Describe,

    #[token("ADD", ignore(ascii_case))]
    Add,

    #[token("COLUMN", ignore(ascii_case))]
    Column,

    #[token("RENAME", ignore(ascii_case))]
    Rename,

    // Condition keywords (recognized only to reject compound predicates)
    #[token("AND", ignore(ascii_case))]
    And,

    #[token("OR", ignore(ascii_case))]
    Or,

    #[token("NOT", ignore(ascii_case))]
    Not,

    #[token("IN", ignore(ascii_case))]
    In,

    #[token("LIKE", ignore(ascii_case))]
    Like,

    #[token("IS", ignore(ascii_case))]
    Is,

    #[token("BETWEEN", ignore(ascii_case))]
    Between,

    // Symbols
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token("*")]
    Star,

    #[token(".")]
    Dot,

    #[token("=")]
    #[token("==")]
    Equals,

    #[token("<>")]
    #[token("!=")]
    NotEquals,

    #[token("<")]
    LessThan,

    #[token("<=")]
    LessEquals,

    #[token(">")]
    GreaterThan,

    #[token(">=")]
    GreaterEquals,

    // Literals
    #[regex(r"-?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"'([^']|'')*'", |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].replace("''", "'"))
    })]
    StringSingle(String),

    #[regex(r#""([^"]|"")*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].replace("\"\"", "\""))
    })]
    StringDouble(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"`[^`]+`", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    EscapedIdentifier(String),

    // Comment (skip)
    #[regex(r"--[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/", logos::skip)]
    BlockComment,

    /// Any character the grammar has no token for; kept so raw literal
    /// text such as `a@b.com` can still be sliced out
    Unknown,
}

impl Token {
    /// Keywords that may double as table, column or database names
    pub fn is_soft_keyword(&self) -> bool {
        matches!(
            self,
            Token::Transaction
                | Token::Key
                | Token::Show
                | Token::Tables
                | Token::Databases
                | Token::Describe
                | Token::Add
                | Token::Column
                | Token::Rename
        )
    }

    /// Check if this token is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Equals
                | Token::NotEquals
                | Token::LessThan
                | Token::LessEquals
                | Token::GreaterThan
                | Token::GreaterEquals
        )
    }

    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Number(_) | Token::StringSingle(_) | Token::StringDouble(_)
        )
    }
}

/// A token with its byte range in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

impl Spanned {
    /// Name text if this token can stand for a table, column or database
    pub fn name(&self, src: &str) -> Option<String> {
        match &self.token {
            Token::Identifier(s) | Token::EscapedIdentifier(s) => Some(s.clone()),
            t if t.is_soft_keyword() => src.get(self.span.clone()).map(str::to_string),
            _ => None,
        }
    }
}

/// Tokenize SQL text, keeping spans
///
/// Unrecognized characters become [`Token::Unknown`] rather than failing;
/// each parser decides whether they are acceptable where they appear.
pub fn tokenize_spanned(input: &str) -> Vec<Spanned> {
    Token::lexer(input)
        .spanned()
        .map(|(result, span)| Spanned {
            token: result.unwrap_or(Token::Unknown),
            span,
        })
        .collect()
}

/// Tokenize SQL text, dropping spans
pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_spanned(input).into_iter().map(|s| s.token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_statement() {
        let tokens = tokenize("SELECT * FROM users WHERE age > 30");

        assert_eq!(tokens[0], Token::Select);
        assert_eq!(tokens[1], Token::Star);
        assert_eq!(tokens[2], Token::From);
        assert!(matches!(&tokens[3], Token::Identifier(s) if s == "users"));
        assert_eq!(tokens[4], Token::Where);
        assert_eq!(tokens[6], Token::GreaterThan);
        assert_eq!(tokens[7], Token::Number(30.0));
    }

    #[test]
    fn test_identifiers_keep_case() {
        let tokens = tokenize("select Name from Users");

        assert!(tokens.iter().any(|t| matches!(t, Token::Identifier(s) if s == "Name")));
        assert!(tokens.iter().any(|t| matches!(t, Token::Identifier(s) if s == "Users")));
    }

    #[test]
    fn test_keywords_are_not_prefix_matched() {
        let tokens = tokenize("selected updates");
        assert!(matches!(&tokens[0], Token::Identifier(s) if s == "selected"));
        assert!(matches!(&tokens[1], Token::Identifier(s) if s == "updates"));
    }

    #[test]
    fn test_strings() {
        let tokens = tokenize(r#"'Alice' "Bob" 'it''s'"#);

        assert_eq!(tokens[0], Token::StringSingle("Alice".into()));
        assert_eq!(tokens[1], Token::StringDouble("Bob".into()));
        assert_eq!(tokens[2], Token::StringSingle("it's".into()));
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("= != <> < <= > >=");
        assert_eq!(
            tokens,
            vec![
                Token::Equals,
                Token::NotEquals,
                Token::NotEquals,
                Token::LessThan,
                Token::LessEquals,
                Token::GreaterThan,
                Token::GreaterEquals,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 -1.5 .25 1e3");
        assert_eq!(
            tokens,
            vec![
                Token::Number(42.0),
                Token::Number(-1.5),
                Token::Number(0.25),
                Token::Number(1000.0),
            ]
        );
    }

    #[test]
    fn test_unknown_characters_are_kept() {
        let spanned = tokenize_spanned("a = x@y");
        assert!(spanned.iter().any(|s| s.token == Token::Unknown));
        let last = spanned.last().unwrap();
        assert_eq!(last.span.end, 7);
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("SELECT a -- trailing\nFROM /* inline */ t");
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_spans_slice_source() {
        let src = "VALUES (5, 'x')";
        let spanned = tokenize_spanned(src);
        let string = spanned.iter().find(|s| s.token.is_literal() && s.span.start > 10).unwrap();
        assert_eq!(&src[string.span.clone()], "'x'");
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let tokens1 = tokenize("begin COMMIT rollback");
        assert_eq!(tokens1, vec![Token::Begin, Token::Commit, Token::Rollback]);
    }
}
