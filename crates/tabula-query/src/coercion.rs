//! Type coercion
//!
//! Parses declared SQL types into a [`SqlType`] and normalizes raw input
//! text to the column's base type. Coercion never fails; unparseable input
//! falls back to a neutral value or the original text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use tabula_core::value::parse_number;
use tabula_core::{BaseType, Column, SqlType, Value};

const NUMBER_TYPES: &[&str] = &[
    "INT", "INTEGER", "BIGINT", "SMALLINT", "TINYINT", "DECIMAL", "NUMERIC", "FLOAT", "DOUBLE",
    "REAL",
];

const TEXT_TYPES: &[&str] = &["CHAR", "NCHAR", "VARCHAR", "NVARCHAR", "TEXT", "STRING"];

const BOOLEAN_TYPES: &[&str] = &["BOOL", "BOOLEAN"];

const DATETIME_TYPES: &[&str] = &["DATETIME", "TIMESTAMP"];

const TRUTHY: &[&str] = &["1", "true", "yes", "y", "on"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Map a type keyword to its base type
pub fn base_type_for(keyword: &str) -> BaseType {
    let upper = keyword.to_ascii_uppercase();
    let upper = upper.as_str();
    if NUMBER_TYPES.contains(&upper) {
        BaseType::Number
    } else if TEXT_TYPES.contains(&upper) {
        BaseType::Text
    } else if BOOLEAN_TYPES.contains(&upper) {
        BaseType::Boolean
    } else if upper == "DATE" {
        BaseType::Date
    } else if DATETIME_TYPES.contains(&upper) {
        BaseType::DateTime
    } else {
        BaseType::Text
    }
}

/// Parse a type declaration of the form `NAME`, `NAME(n)` or `NAME(p,s)`
///
/// Returns `None` for any other shape. Unknown keywords map to text.
pub fn parse_type(text: &str) -> Option<SqlType> {
    let original = text.trim();
    let (name, args) = match original.find('(') {
        Some(open) => {
            let inner = original[open + 1..].strip_suffix(')')?;
            (original[..open].trim_end(), Some(inner))
        }
        None => (original, None),
    };

    let mut chars = name.chars();
    let valid_name = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return None;
    }

    let args: Vec<u32> = match args {
        Some(inner) => inner
            .split(',')
            .map(|a| a.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?,
        None => Vec::new(),
    };

    let base_type = base_type_for(name);
    let (length, precision, scale) = match (base_type, args.as_slice()) {
        (_, []) => (None, None, None),
        (BaseType::Text, [n]) => (Some(*n), None, None),
        (_, [p]) => (None, Some(*p), None),
        (BaseType::Text, [_, _]) => (None, None, None),
        (_, [p, s]) => (None, Some(*p), Some(*s)),
        _ => return None,
    };

    Some(SqlType {
        original: original.to_string(),
        base_type,
        length,
        precision,
        scale,
    })
}

/// Coerce raw input text to a column's base type
pub fn coerce(raw: &str, column: &Column) -> Value {
    match column.base_type {
        BaseType::Number => coerce_number(raw, column.precision, column.scale),
        BaseType::Boolean => {
            let lowered = raw.trim().to_lowercase();
            Value::Boolean(TRUTHY.contains(&lowered.as_str()))
        }
        BaseType::Date => match parse_date(raw.trim()) {
            Some(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
            None => Value::Text(raw.to_string()),
        },
        BaseType::DateTime => match parse_datetime(raw.trim()) {
            Some(dt) => Value::Text(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => Value::Text(raw.to_string()),
        },
        BaseType::Text => {
            let trimmed = raw.trim();
            match column.length {
                Some(len) => Value::Text(trimmed.chars().take(len as usize).collect()),
                None => Value::Text(trimmed.to_string()),
            }
        }
    }
}

fn coerce_number(raw: &str, precision: Option<u32>, scale: Option<u32>) -> Value {
    let n = parse_number(raw).unwrap_or(0.0);
    match (precision, scale) {
        (Some(_), Some(scale)) => {
            let factor = 10f64.powi(scale.min(i32::MAX as u32) as i32);
            let scaled = n * factor;
            // Scales past f64 range leave the value unrounded
            if scaled.is_finite() {
                Value::Number(scaled.round() / factor)
            } else {
                Value::Number(n)
            }
        }
        _ => Value::Number(n),
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| parse_naive_datetime(text).map(|dt| dt.date()))
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = parse_naive_datetime(text) {
        return Some(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
