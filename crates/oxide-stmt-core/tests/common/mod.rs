//! Shared test helpers: a scripted in-memory backend.

#![allow(dead_code)]

use std::collections::HashMap;

use oxide_stmt_core::{
    ColumnInfo, Connection, Engine, Introspect, PreparedStatement, Row, SqlValue, Stage,
};

/// One call observed by the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Begin,
    Prepare(String),
    Bind(usize, SqlValue),
    Execute,
    Fetch,
    Commit,
    Rollback,
    Describe(String),
}

/// Failure injected at a given stage.
#[derive(Debug, thiserror::Error)]
#[error("injected failure at {0}")]
pub struct FakeError(pub Stage);

/// Records every call and answers from a script.
#[derive(Debug, Default)]
pub struct FakeConnection {
    pub events: Vec<Event>,
    pub in_transaction: bool,
    pub rows: Vec<Row>,
    pub fail_at: Option<Stage>,
    pub tables: HashMap<String, Vec<ColumnInfo>>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by every fetch.
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    /// Fails the first call made at `stage`.
    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    /// Registers a physical table with the given `(name, type, key)` columns.
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str, &str)]) -> Self {
        let columns = columns
            .iter()
            .map(|(column, column_type, key)| ColumnInfo {
                name: (*column).to_string(),
                column_type: (*column_type).to_string(),
                nullable: key.is_empty(),
                key: (*key).to_string(),
                default: None,
                extra: String::new(),
            })
            .collect();
        self.tables.insert(name.to_string(), columns);
        self
    }

    /// SQL texts passed to prepare, in order.
    pub fn prepared(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Prepare(sql) => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Values bound, in order.
    pub fn bound(&self) -> Vec<(usize, SqlValue)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Bind(pos, value) => Some((*pos, value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    fn check(&mut self, stage: Stage) -> Result<(), FakeError> {
        if self.fail_at == Some(stage) {
            self.fail_at = None;
            return Err(FakeError(stage));
        }
        Ok(())
    }
}

pub struct FakeStatement<'c> {
    conn: &'c mut FakeConnection,
}

impl Connection for FakeConnection {
    type Error = FakeError;
    type Statement<'c> = FakeStatement<'c>;

    fn begin_transaction(&mut self) -> Result<(), FakeError> {
        self.check(Stage::Begin)?;
        self.events.push(Event::Begin);
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), FakeError> {
        self.check(Stage::Commit)?;
        self.events.push(Event::Commit);
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), FakeError> {
        self.check(Stage::Rollback)?;
        self.events.push(Event::Rollback);
        self.in_transaction = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn prepare(&mut self, sql: &str) -> Result<FakeStatement<'_>, FakeError> {
        self.check(Stage::Prepare)?;
        self.events.push(Event::Prepare(sql.to_string()));
        Ok(FakeStatement { conn: self })
    }
}

impl PreparedStatement for FakeStatement<'_> {
    type Error = FakeError;

    fn bind_value(&mut self, position: usize, value: &SqlValue) -> Result<(), FakeError> {
        self.conn.check(Stage::Bind)?;
        self.conn.events.push(Event::Bind(position, value.clone()));
        Ok(())
    }

    fn execute(&mut self) -> Result<(), FakeError> {
        self.conn.check(Stage::Execute)?;
        self.conn.events.push(Event::Execute);
        Ok(())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>, FakeError> {
        self.conn.check(Stage::Fetch)?;
        self.conn.events.push(Event::Fetch);
        Ok(self.conn.rows.clone())
    }
}

impl Introspect for FakeConnection {
    type Error = FakeError;

    fn describe_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, FakeError> {
        self.check(Stage::Introspect)?;
        self.events.push(Event::Describe(table.to_string()));
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }
}

/// An engine over a fresh fake connection.
pub fn engine() -> Engine<FakeConnection> {
    Engine::new(FakeConnection::new())
}

/// A row from `(column, value)` pairs.
pub fn row(entries: &[(&str, SqlValue)]) -> Row {
    entries
        .iter()
        .map(|(column, value)| (*column, value.clone()))
        .collect()
}
