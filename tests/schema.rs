//! Schema statements, introspection and the permission log.

use tabula::core::{GrantAction, PermissionScope};
use tabula::{
    BaseType, Error, Interpreter, MemorySnapshotStack, MemoryStore, QueryResult, Session, Store,
    Value,
};

type MemorySession = Session<MemoryStore, MemorySnapshotStack>;

fn session_with_db() -> MemorySession {
    let mut s = Session::new(Interpreter::new(MemoryStore::new(), MemorySnapshotStack::new()));
    s.execute("CREATE DATABASE shop").unwrap();
    s
}

fn first_column(result: &QueryResult) -> Vec<Value> {
    result.values().into_iter().map(|row| row[0].clone()).collect()
}

// ===========================================================================
// 1. CREATE / DROP
// ===========================================================================

#[test]
fn table_level_primary_key_marks_columns() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE lines (order_id INT, line INT, qty INT, PRIMARY KEY (order_id, line))")
        .unwrap();

    let result = s.execute("SELECT * FROM lines").unwrap();
    let keys: Vec<bool> = result.columns().iter().map(|c| c.is_primary_key).collect();
    assert_eq!(keys, vec![true, true, false]);

    assert!(matches!(
        s.execute("CREATE TABLE bad (a INT, PRIMARY KEY (b))").unwrap_err(),
        Error::ColumnNotFound(_)
    ));
}

#[test]
fn column_types_keep_declared_parameters() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (price NUMERIC(10, 2), code NVARCHAR(8), at TIMESTAMP, misc BLOB)")
        .unwrap();

    let columns = s.execute("SELECT * FROM t").unwrap().columns().to_vec();
    assert_eq!(columns[0].base_type, BaseType::Number);
    assert_eq!((columns[0].precision, columns[0].scale), (Some(10), Some(2)));
    assert_eq!(columns[1].base_type, BaseType::Text);
    assert_eq!(columns[1].length, Some(8));
    assert_eq!(columns[2].base_type, BaseType::DateTime);
    assert_eq!(columns[3].base_type, BaseType::Text);
    assert_eq!(columns[3].original_type, "BLOB");
}

#[test]
fn malformed_column_definitions_fail() {
    let mut s = session_with_db();
    assert!(matches!(
        s.execute("CREATE TABLE t (a)").unwrap_err(),
        Error::InvalidColumnDefinition(_)
    ));
    assert!(matches!(
        s.execute("CREATE TABLE t (a VARCHAR(x))").unwrap_err(),
        Error::InvalidType(_)
    ));
}

#[test]
fn drop_table_and_database() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a INT)").unwrap();

    assert_eq!(s.execute("DROP TABLE T").unwrap().message(), "Table 't' dropped");
    assert!(matches!(
        s.execute("DROP TABLE t").unwrap_err(),
        Error::TableNotFound(_)
    ));

    s.execute("DROP DATABASE shop").unwrap();
    assert_eq!(s.active(), None);
    assert!(matches!(
        s.execute("DROP DATABASE shop").unwrap_err(),
        Error::DatabaseNotFound(_)
    ));
    assert!(matches!(
        s.execute("USE shop").unwrap_err(),
        Error::DatabaseNotFound(_)
    ));
}

#[test]
fn dropping_other_database_keeps_selection() {
    let mut s = session_with_db();
    s.execute("CREATE DATABASE archive").unwrap();
    s.execute("USE shop").unwrap();
    s.execute("DROP DATABASE archive").unwrap();
    assert_eq!(s.active_name().unwrap().as_deref(), Some("shop"));
}

// ===========================================================================
// 2. ALTER TABLE
// ===========================================================================

#[test]
fn alter_add_and_drop_column() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a INT)").unwrap();
    s.execute("INSERT INTO t (a) VALUES (1)").unwrap();

    s.execute("ALTER TABLE t ADD COLUMN note VARCHAR(5)").unwrap();
    let result = s.execute("SELECT * FROM t").unwrap();
    assert_eq!(result.values(), vec![vec![Value::Number(1.0), Value::Null]]);
    let note_id = result.columns()[1].id;

    s.execute("ALTER TABLE t DROP note").unwrap();
    s.execute("ALTER TABLE t ADD note TEXT").unwrap();
    let readded = s.execute("SELECT note FROM t").unwrap();
    assert_ne!(readded.columns()[0].id, note_id);

    assert!(matches!(
        s.execute("ALTER TABLE t ADD A TEXT").unwrap_err(),
        Error::DuplicateColumnName(_)
    ));
    assert!(matches!(
        s.execute("ALTER TABLE t DROP COLUMN missing").unwrap_err(),
        Error::ColumnNotFound(_)
    ));
}

#[test]
fn alter_rename_table() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a INT)").unwrap();
    s.execute("CREATE TABLE other (a INT)").unwrap();

    assert!(matches!(
        s.execute("ALTER TABLE t RENAME TO OTHER").unwrap_err(),
        Error::TableAlreadyExists(_)
    ));

    s.execute("ALTER TABLE t RENAME TO T").unwrap();
    s.execute("ALTER TABLE T RENAME TO renamed").unwrap();
    assert!(s.execute("SELECT * FROM renamed").is_ok());
    assert!(matches!(
        s.execute("SELECT * FROM t").unwrap_err(),
        Error::TableNotFound(_)
    ));
}

// ===========================================================================
// 3. INTROSPECTION
// ===========================================================================

#[test]
fn show_databases_and_tables() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE a (x INT)").unwrap();
    s.execute("CREATE TABLE b (x INT, y INT)").unwrap();
    s.execute("INSERT INTO b (x, y) VALUES (1, 2)").unwrap();
    s.execute("CREATE DATABASE empty").unwrap();

    let databases = s.execute("SHOW DATABASES").unwrap();
    assert_eq!(
        databases.values(),
        vec![
            vec![Value::from("shop"), Value::Number(2.0)],
            vec![Value::from("empty"), Value::Number(0.0)],
        ]
    );

    s.execute("USE shop").unwrap();
    let tables = s.execute("SHOW TABLES").unwrap();
    assert_eq!(
        tables.values(),
        vec![
            vec![Value::from("a"), Value::Number(1.0), Value::Number(0.0)],
            vec![Value::from("b"), Value::Number(2.0), Value::Number(1.0)],
        ]
    );
}

#[test]
fn describe_lists_column_metadata() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(20))")
        .unwrap();

    for statement in ["DESCRIBE t", "desc T"] {
        let result = s.execute(statement).unwrap();
        assert_eq!(
            result.values(),
            vec![
                vec![
                    Value::from("id"),
                    Value::from("INT"),
                    Value::from("number"),
                    Value::Boolean(true),
                ],
                vec![
                    Value::from("name"),
                    Value::from("VARCHAR(20)"),
                    Value::from("text"),
                    Value::Boolean(false),
                ],
            ]
        );
    }
    assert_eq!(first_column(&s.execute("DESCRIBE t").unwrap()).len(), 2);
}

// ===========================================================================
// 4. LITERALS
// ===========================================================================

#[test]
fn string_escapes_and_null_literals() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a TEXT, b INT)").unwrap();
    s.execute("INSERT INTO t (a, b) VALUES ('it''s', NULL)").unwrap();
    s.execute("INSERT INTO t (a, b) VALUES ('x, y', 2)").unwrap();

    let result = s.execute("SELECT a FROM t WHERE a = 'it''s'").unwrap();
    assert_eq!(first_column(&result), vec![Value::from("it's")]);

    let result = s.execute("SELECT b FROM t").unwrap();
    assert_eq!(first_column(&result), vec![Value::Null, Value::Number(2.0)]);

    s.execute("UPDATE t SET a = 'p, q', b = 3 WHERE b = 2").unwrap();
    let result = s.execute("SELECT a FROM t WHERE b = 3").unwrap();
    assert_eq!(first_column(&result), vec![Value::from("p, q")]);
}

#[test]
fn insert_count_mismatch_is_syntax_error() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a INT, b INT)").unwrap();
    assert!(matches!(
        s.execute("INSERT INTO t (a, b) VALUES (1)").unwrap_err(),
        Error::InvalidSyntax(_)
    ));
}

// ===========================================================================
// 5. PERMISSIONS
// ===========================================================================

#[test]
fn grant_and_revoke_are_recorded_but_not_enforced() {
    let mut s = session_with_db();
    s.execute("CREATE TABLE t (a INT)").unwrap();

    assert_eq!(
        s.execute("GRANT SELECT, INSERT ON TABLE t TO alice").unwrap().message(),
        "GRANT SELECT, INSERT ON TABLE t TO alice recorded"
    );
    s.execute("REVOKE ALL ON DATABASE shop FROM 'bob'").unwrap();

    let set = s.interpreter().store().load().unwrap();
    let log = &set.find_by_name("shop").unwrap().meta.permissions;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].action, GrantAction::Grant);
    assert_eq!(log[0].privilege, "SELECT, INSERT");
    assert_eq!(log[0].scope, PermissionScope::Table);
    assert_eq!(log[1].action, GrantAction::Revoke);
    assert_eq!(log[1].scope, PermissionScope::Database);
    assert_eq!(log[1].user, "bob");

    // Nothing is enforced
    s.execute("INSERT INTO t (a) VALUES (1)").unwrap();
}

#[test]
fn grant_requires_active_database() {
    let mut s = Session::new(Interpreter::new(MemoryStore::new(), MemorySnapshotStack::new()));
    assert!(matches!(
        s.execute("GRANT SELECT ON TABLE t TO alice").unwrap_err(),
        Error::NoActiveDatabase
    ));
}
