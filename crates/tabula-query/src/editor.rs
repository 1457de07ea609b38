//! Row editing with type coercion
//!
//! Form-style entry: every raw value is coerced to its column's declared
//! type, so `VARCHAR(3)` truncates and `BOOLEAN` accepts `yes`. SQL INSERT
//! and UPDATE deliberately skip this and store classified literals as-is.

use crate::coercion::coerce;
use std::collections::BTreeMap;
use tabula_core::{Error, Result, RowId, Table, Value};

/// Append a row built from `(column, raw value)` pairs
///
/// Every column must exist; nothing is inserted otherwise.
pub fn insert_coerced<I, K, V>(table: &mut Table, values: I) -> Result<RowId>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut cells = BTreeMap::new();
    for (name, raw) in values {
        let column = table
            .column(name.as_ref())
            .ok_or_else(|| Error::ColumnNotFound(name.as_ref().to_string()))?;
        cells.insert(column.id, coerce(raw.as_ref(), column));
    }
    Ok(table.insert_row(cells))
}

/// Overwrite one cell, returning the stored value
pub fn update_cell(table: &mut Table, row_id: RowId, column: &str, raw: &str) -> Result<Value> {
    let column = table
        .column(column)
        .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
    let (column_id, value) = (column.id, coerce(raw, column));

    let row = table
        .row_mut(row_id)
        .ok_or(Error::RowNotFound(row_id.as_internal()))?;
    row.set(column_id, value.clone());
    Ok(value)
}

/// Remove rows by id
///
/// Fails without removing anything if any id is unknown.
pub fn delete_rows(table: &mut Table, ids: &[RowId]) -> Result<usize> {
    if let Some(missing) = ids.iter().find(|id| table.row(**id).is_none()) {
        return Err(Error::RowNotFound(missing.as_internal()));
    }
    Ok(table.remove_rows(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::parse_type;

    fn table() -> Table {
        let mut table = Table::new("items");
        table.add_column("code", &parse_type("VARCHAR(3)").unwrap(), true);
        table.add_column("price", &parse_type("DECIMAL(6,2)").unwrap(), false);
        table.add_column("active", &parse_type("BOOLEAN").unwrap(), false);
        table
    }

    #[test]
    fn test_insert_coerces_each_value() {
        let mut table = table();
        let id = insert_coerced(
            &mut table,
            [("code", "ABCDE"), ("price", "9.999"), ("Active", "yes")],
        )
        .unwrap();

        let row = table.row(id).unwrap();
        let code = table.column("code").unwrap().id;
        let price = table.column("price").unwrap().id;
        let active = table.column("active").unwrap().id;
        assert_eq!(row.get(code), &Value::from("ABC"));
        assert_eq!(row.get(price), &Value::Number(10.0));
        assert_eq!(row.get(active), &Value::Boolean(true));
    }

    #[test]
    fn test_insert_unknown_column_leaves_table_untouched() {
        let mut table = table();
        let err = insert_coerced(&mut table, [("code", "x"), ("nope", "1")]).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(c) if c == "nope"));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_update_cell() {
        let mut table = table();
        let id = insert_coerced(&mut table, [("code", "A")]).unwrap();
        let value = update_cell(&mut table, id, "price", "abc").unwrap();
        assert_eq!(value, Value::Number(0.0));

        let err = update_cell(&mut table, RowId::from_internal(99), "price", "1").unwrap_err();
        assert!(matches!(err, Error::RowNotFound(99)));
    }

    #[test]
    fn test_delete_rows_is_all_or_nothing() {
        let mut table = table();
        let a = insert_coerced(&mut table, [("code", "A")]).unwrap();
        let b = insert_coerced(&mut table, [("code", "B")]).unwrap();

        assert!(delete_rows(&mut table, &[a, RowId::from_internal(42)]).is_err());
        assert_eq!(table.rows.len(), 2);

        assert_eq!(delete_rows(&mut table, &[a, b]).unwrap(), 2);
        assert!(table.rows.is_empty());
    }
}
