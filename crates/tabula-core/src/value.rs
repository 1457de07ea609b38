//! Cell values and their comparison rules
//!
//! A [`Value`] is what a row stores per column and what a WHERE literal
//! evaluates to. Comparison between mismatched kinds is defined explicitly
//! per pair in [`Value::loose_eq`] and [`Value::loose_cmp`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A value stored in a row cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing or explicit NULL
    Null,

    /// Boolean value
    Boolean(bool),

    /// Numeric value (all SQL numeric types collapse to f64)
    Number(f64),

    /// UTF-8 text, also used for normalized dates and datetimes
    Text(String),
}

impl Value {
    /// Classify a SQL literal as written in statement text
    ///
    /// Quoted text is unwrapped (a doubled quote inside is an escaped
    /// quote), bare `true`/`false` become booleans, bare `null` becomes
    /// [`Value::Null`], numeric-looking text becomes a number and anything
    /// else is kept as raw text.
    pub fn from_literal(text: &str) -> Value {
        let text = text.trim();

        if let Some(unquoted) = unquote(text) {
            return Value::Text(unquoted);
        }

        if text.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        if text.eq_ignore_ascii_case("null") {
            return Value::Null;
        }

        match parse_number(text) {
            Some(n) => Value::Number(n),
            None => Value::Text(text.to_string()),
        }
    }

    /// Returns true if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Coercive equality used by `=` and `!=`
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Null, _) | (_, Null) => false,
            (Number(a), Number(b)) => a == b,
            (Text(a), Text(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Number(n), Text(t)) | (Text(t), Number(n)) => {
                parse_number(t).is_some_and(|parsed| parsed == *n)
            }
            (Boolean(b), Number(n)) | (Number(n), Boolean(b)) => bool_to_number(*b) == *n,
            (Boolean(b), Text(t)) | (Text(t), Boolean(b)) => match parse_number(t) {
                Some(parsed) => parsed == bool_to_number(*b),
                None => t.trim().eq_ignore_ascii_case(bool_text(*b)),
            },
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`
    ///
    /// Returns `None` when either side is null or a number is NaN, which
    /// makes every ordered comparison false.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            (Number(a), Number(b)) => a.partial_cmp(b),
            (Text(a), Text(b)) => Some(a.as_str().cmp(b.as_str())),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Number(n), Text(t)) => match parse_number(t) {
                Some(parsed) => n.partial_cmp(&parsed),
                None => Some(format_number(*n).as_str().cmp(t.as_str())),
            },
            (Text(t), Number(n)) => match parse_number(t) {
                Some(parsed) => parsed.partial_cmp(n),
                None => Some(t.as_str().cmp(format_number(*n).as_str())),
            },
            (Boolean(b), Number(n)) => bool_to_number(*b).partial_cmp(n),
            (Number(n), Boolean(b)) => n.partial_cmp(&bool_to_number(*b)),
            (Boolean(b), Text(t)) => Some(cmp_bool_text(*b, t)),
            (Text(t), Boolean(b)) => Some(cmp_bool_text(*b, t).reverse()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Parse numeric-looking text
///
/// Only digits, sign, decimal point and exponent characters are accepted so
/// words like `inf` or `NaN` stay text.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        || !text.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Strip matching single or double quotes, resolving doubled-quote escapes
pub fn unquote(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if (first != '\'' && first != '"') || text.len() < 2 || !text.ends_with(first) {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    let doubled: String = [first, first].iter().collect();
    Some(inner.replace(&doubled, &first.to_string()))
}

fn bool_to_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn bool_text(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// Boolean against text: numeric when the text parses, else against the
/// trimmed, lowercased text. Agrees with `loose_eq`.
fn cmp_bool_text(b: bool, text: &str) -> Ordering {
    match parse_number(text) {
        Some(parsed) => bool_to_number(b)
            .partial_cmp(&parsed)
            .unwrap_or(Ordering::Less),
        None => bool_text(b).cmp(text.trim().to_ascii_lowercase().as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_literal_classification() {
        assert_eq!(Value::from_literal("'Alice'"), Value::Text("Alice".into()));
        assert_eq!(Value::from_literal("\"Bob\""), Value::Text("Bob".into()));
        assert_eq!(Value::from_literal("'it''s'"), Value::Text("it's".into()));
        assert_eq!(Value::from_literal("TRUE"), Value::Boolean(true));
        assert_eq!(Value::from_literal("false"), Value::Boolean(false));
        assert_eq!(Value::from_literal("null"), Value::Null);
        assert_eq!(Value::from_literal("42"), Value::Number(42.0));
        assert_eq!(Value::from_literal("-1.5"), Value::Number(-1.5));
        assert_eq!(Value::from_literal("hello"), Value::Text("hello".into()));
        assert_eq!(Value::from_literal("'5'"), Value::Text("5".into()));
    }

    #[test]
    fn test_parse_number_rejects_words() {
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("2024-01-05"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(6.0).to_string(), "6");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_loose_eq_pairs() {
        assert!(Value::Number(5.0).loose_eq(&Value::Text("5".into())));
        assert!(!Value::Number(5.0).loose_eq(&Value::Text("five".into())));
        assert!(Value::Boolean(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Boolean(false).loose_eq(&Value::Text("FALSE".into())));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
    }

    #[test]
    fn test_loose_cmp_pairs() {
        assert_eq!(
            Value::Number(10.0).loose_cmp(&Value::Number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Text("10".into()).loose_cmp(&Value::Number(9.0)),
            Some(Ordering::Greater)
        );
        // Non-numeric text compares lexically against the number's display form
        assert_eq!(
            Value::Number(10.0).loose_cmp(&Value::Text("abc".into())),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Null.loose_cmp(&Value::Number(1.0)), None);
        assert_eq!(
            Value::Text("2024-01-05".into()).loose_cmp(&Value::Text("2023-12-31".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_json_shape() {
        let values = vec![
            Value::Null,
            Value::Boolean(true),
            Value::Number(1.5),
            Value::Text("x".into()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,true,1.5,"x"]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    fn any_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Boolean),
            (-5i64..5).prop_map(|n| Value::Number(n as f64)),
            (-1.0e6f64..1.0e6).prop_map(Value::Number),
            "[a-z0-9 .]{0,5}".prop_map(Value::Text),
            prop_oneof![
                Just("TRUE"),
                Just(" false "),
                Just("True"),
                Just("1"),
                Just(" 0 "),
                Just("1.0"),
                Just("yes"),
            ]
            .prop_map(Value::from),
        ]
    }

    #[test]
    fn test_boolean_text_ordering_matches_equality() {
        let t = Value::Boolean(true);
        for text in ["TRUE", " true ", "1", "1.0"] {
            let literal = Value::from(text);
            assert!(t.loose_eq(&literal), "{}", text);
            assert_eq!(t.loose_cmp(&literal), Some(Ordering::Equal), "{}", text);
            assert_eq!(literal.loose_cmp(&t), Some(Ordering::Equal), "{}", text);
        }
        assert_eq!(t.loose_cmp(&Value::from("2")), Some(Ordering::Less));
        assert_eq!(
            Value::Boolean(false).loose_cmp(&Value::from("TRUE")),
            Some(Ordering::Less)
        );
    }

    proptest! {
        #[test]
        fn loose_eq_is_symmetric(a in -1000i64..1000, s in "[a-z0-9]{0,6}") {
            let n = Value::Number(a as f64);
            let t = Value::Text(s);
            prop_assert_eq!(n.loose_eq(&t), t.loose_eq(&n));
        }

        #[test]
        fn equality_agrees_with_ordering(a in any_value(), b in any_value()) {
            prop_assume!(!a.is_null() && !b.is_null());
            prop_assert_eq!(a.loose_eq(&b), a.loose_cmp(&b) == Some(Ordering::Equal));
            prop_assert_eq!(a.loose_cmp(&b), b.loose_cmp(&a).map(Ordering::reverse));
        }

        #[test]
        fn integers_round_trip_through_literals(a in -1_000_000i64..1_000_000) {
            prop_assert_eq!(Value::from_literal(&a.to_string()), Value::Number(a as f64));
        }
    }
}
