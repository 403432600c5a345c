//! Schema operations executed through the engine.

mod common;

use common::{Event, FakeConnection};
use oxide_stmt_core::{
    Column, CreateMode, Engine, Error, SchemaOperation, SqlType, Stage, Table,
};

fn users_table() -> Table {
    Table::new("users")
        .add_column(
            Column::new("id", SqlType::Int)
                .length(10)
                .unsigned()
                .not_null()
                .auto_increment(),
        )
        .add_column(Column::new("email", SqlType::Varchar).length(255).not_null())
}

fn existing_users() -> FakeConnection {
    FakeConnection::new().with_table(
        "users",
        &[
            ("id", "int(10) unsigned", "PRI"),
            ("email", "varchar(255)", "UNI"),
            ("legacy", "text", ""),
        ],
    )
}

#[test]
fn test_create_table_executes_in_transaction() {
    let mut engine = Engine::new(FakeConnection::new());
    let mut table = users_table();

    let rows = engine.create_table(&mut table).unwrap();

    assert!(rows.is_empty());
    let conn = engine.connection();
    assert_eq!(
        conn.prepared(),
        vec![
            "CREATE TABLE users (id INT(10) unsigned NOT NULL AUTO_INCREMENT, \
             email VARCHAR(255) NOT NULL, PRIMARY KEY(id)) ENGINE=InnoDB DEFAULT CHARSET=utf8;"
        ]
    );
    assert_eq!(conn.count(&Event::Begin), 1);
    assert_eq!(conn.count(&Event::Commit), 1);
    assert_eq!(conn.count(&Event::Fetch), 0);
    assert_eq!(table.primary_key(), Some("id"));
    assert_eq!(engine.query(), None);
}

#[test]
fn test_create_table_variants() {
    let mut engine = Engine::new(FakeConnection::new());

    engine.create_table_if_not_exists(&mut users_table()).unwrap();
    engine.create_table_drop_if_exists(&mut users_table()).unwrap();

    let prepared = engine.connection().prepared();
    assert_eq!(prepared.len(), 3);
    assert!(prepared[0].starts_with("CREATE TABLE IF NOT EXISTS users ("));
    assert_eq!(prepared[1], "DROP TABLE IF EXISTS users;");
    assert!(prepared[2].starts_with("CREATE TABLE users ("));
    assert_eq!(engine.connection().count(&Event::Commit), 3);
}

#[test]
fn test_invalid_create_sends_nothing() {
    let mut engine = Engine::new(FakeConnection::new());
    let mut table = users_table().add_column(Column::new("nick", SqlType::Varchar));

    let err = engine.create_table(&mut table).unwrap_err();

    assert!(matches!(err, Error::MissingLength { ref column, .. } if column == "nick"));
    assert!(engine.connection().events.is_empty());
}

#[test]
fn test_alter_table_introspects_first() {
    let mut engine = Engine::new(existing_users());
    let table = Table::new("users")
        .drop_column("legacy")
        .alter_column(Column::alter("email").comment("login"))
        .add_column(Column::new("created_at", SqlType::DateTime).not_null());

    engine.alter_table(&table).unwrap();

    let conn = engine.connection();
    assert_eq!(conn.events[0], Event::Describe(String::from("users")));
    assert_eq!(
        conn.prepared(),
        vec![
            "ALTER TABLE users DROP COLUMN legacy, \
             CHANGE COLUMN email email varchar(255) COMMENT \"login\", \
             ADD created_at DATETIME NOT NULL;"
        ]
    );
    assert_eq!(conn.count(&Event::Commit), 1);
}

#[test]
fn test_alter_dropping_unknown_column_issues_nothing() {
    let mut engine = Engine::new(existing_users());
    let table = Table::new("users").drop_column("ghost");

    let err = engine.alter_table(&table).unwrap_err();

    assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "ghost"));
    assert!(engine.connection().prepared().is_empty());
    assert_eq!(engine.connection().count(&Event::Begin), 0);
}

#[test]
fn test_alter_missing_table() {
    let mut engine = Engine::new(FakeConnection::new());
    let table = Table::new("nowhere").drop_column("a");

    let err = engine.alter_table(&table).unwrap_err();
    assert!(matches!(err, Error::EmptyTable(ref name) if name == "nowhere"));
}

#[test]
fn test_introspection_failure_is_backend_error() {
    let mut engine = Engine::new(existing_users().failing_at(Stage::Introspect));
    let err = engine
        .alter_table(&Table::new("users").drop_column("legacy"))
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Introspect));
}

#[test]
fn test_add_index() {
    let mut engine = Engine::new(existing_users());

    engine
        .add_index(&Table::new("users"), "idx_email", "email(10), id", true)
        .unwrap();

    assert_eq!(
        engine.connection().prepared(),
        vec!["CREATE UNIQUE INDEX idx_email ON users (email(10), id);"]
    );
}

#[test]
fn test_add_index_unknown_column() {
    let mut engine = Engine::new(existing_users());
    let err = engine
        .add_index(&Table::new("users"), "idx_phone", "phone", false)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { .. }));
    assert!(engine.connection().prepared().is_empty());
}

#[test]
fn test_plan_and_apply_operations() {
    let mut engine = Engine::new(existing_users());
    let mut table = Table::new("users").drop_column("legacy");

    let planned = engine.plan(&SchemaOperation::AlterTable, &mut table).unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].sql, "ALTER TABLE users DROP COLUMN legacy;");
    assert!(engine.connection().prepared().is_empty());

    let mut created = users_table();
    engine
        .apply(
            &SchemaOperation::CreateTable {
                mode: CreateMode::DropIfExists,
            },
            &mut created,
        )
        .unwrap();
    assert_eq!(engine.connection().prepared().len(), 2);
    assert_eq!(
        engine.connection().count(&Event::Describe(String::from("users"))),
        1
    );
}

#[test]
fn test_failed_ddl_rolls_back() {
    let mut engine = Engine::new(FakeConnection::new().failing_at(Stage::Execute));
    let err = engine.create_table(&mut users_table()).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Execute));
    assert_eq!(engine.connection().count(&Event::Rollback), 1);
}
