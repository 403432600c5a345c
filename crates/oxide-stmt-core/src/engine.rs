//! Statement execution.
//!
//! [`Engine`] owns one connection and one staged statement at a time.
//! A statement is staged by [`Engine::build`] (or [`Engine::set_query`]),
//! run by [`Engine::execute`], and the staged state is cleared after every
//! successful run.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::builder::{self, Statement, StatementBuilder};
use crate::condition::Bindings;
use crate::connection::{Connection, PreparedStatement};
use crate::descriptor::{Resource, Table};
use crate::error::{Error, Result, Stage};
use crate::introspect::{ColumnInfo, Introspect};
use crate::log::QueryLog;
use crate::schema::{CreateMode, SchemaBuilder, SchemaOperation};
use crate::value::{Row, SqlValue};

/// Whether a statement produces no result set worth fetching.
fn is_ddl(sql: &str) -> bool {
    static DDL_RE: OnceLock<Regex> = OnceLock::new();
    DDL_RE
        .get_or_init(|| {
            Regex::new(r"(?i)^\s*(DROP|CREATE|ALTER|DELETE)\b").expect("valid DDL prefix regex")
        })
        .is_match(sql)
}

/// Builds and executes statements over a [`Connection`].
pub struct Engine<C: Connection> {
    connection: C,
    query: Option<String>,
    binds: Bindings,
    query_log: Option<Box<dyn QueryLog>>,
}

impl<C: Connection + fmt::Debug> fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("connection", &self.connection)
            .field("query", &self.query)
            .field("binds", &self.binds)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> Engine<C> {
    /// Creates an engine with nothing staged.
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            query: None,
            binds: Bindings::new(),
            query_log: None,
        }
    }

    /// Sends every successfully executed statement to `log`.
    #[must_use]
    pub fn with_query_log(mut self, log: impl QueryLog + 'static) -> Self {
        self.query_log = Some(Box::new(log));
        self
    }

    /// Returns the connection.
    pub const fn connection(&self) -> &C {
        &self.connection
    }

    /// Returns the connection mutably.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Consumes the engine, returning the connection.
    pub fn into_inner(self) -> C {
        self.connection
    }

    /// Stages a SELECT (or DELETE when `delete` is set) built from
    /// `resource`, replacing whatever was staged.
    pub fn build(&mut self, resource: &Resource, delete: bool) -> Result<&mut Self> {
        let statement = StatementBuilder.build(resource, delete)?;
        Ok(self.stage(statement))
    }

    /// Stages a statement, replacing whatever was staged.
    pub fn stage(&mut self, statement: Statement) -> &mut Self {
        self.query = Some(statement.sql);
        self.binds = statement.binds;
        self
    }

    /// Stages raw SQL text, keeping the current bind values.
    pub fn set_query(&mut self, sql: impl Into<String>) -> &mut Self {
        self.query = Some(sql.into());
        self
    }

    /// Replaces the bind values; the first value binds to position 1.
    pub fn set_bind_vars(&mut self, values: Vec<SqlValue>) {
        self.binds = Bindings::from(values);
    }

    /// Returns the staged SQL text.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the staged bind values.
    pub const fn bind_vars(&self) -> &Bindings {
        &self.binds
    }

    /// Returns the staged SQL with placeholders replaced by the bound
    /// values, for inspection only.
    pub fn get_query(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(|sql| builder::render(sql, &self.binds))
    }

    /// Clears the staged statement and bind values.
    pub fn cleanup(&mut self) -> &mut Self {
        self.query = None;
        self.binds.clear();
        self
    }

    /// Opens a transaction spanning the following executes.
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.connection
            .begin_transaction()
            .map_err(|e| Error::backend(Stage::Begin, e))
    }

    /// Commits a transaction opened with [`Engine::begin_transaction`].
    pub fn commit(&mut self) -> Result<()> {
        self.connection
            .commit()
            .map_err(|e| Error::backend(Stage::Commit, e))
    }

    /// Rolls back a transaction opened with [`Engine::begin_transaction`].
    pub fn rollback(&mut self) -> Result<()> {
        self.connection
            .rollback()
            .map_err(|e| Error::backend(Stage::Rollback, e))
    }

    /// Whether a transaction is open on the connection.
    pub fn in_transaction(&self) -> bool {
        self.connection.in_transaction()
    }

    /// Executes the staged statement.
    ///
    /// Opens a transaction unless one is already open and commits only a
    /// transaction it opened. Statements starting with DROP, CREATE, ALTER
    /// or DELETE return no rows. On failure the open transaction is rolled
    /// back, the staged state is kept for inspection and the error is
    /// returned; on success the staged state is cleared.
    pub fn execute(&mut self) -> Result<Vec<Row>> {
        let sql = match &self.query {
            Some(sql) if !sql.trim().is_empty() => sql.clone(),
            _ => return Err(Error::NoStatement),
        };
        let owns_transaction = !self.connection.in_transaction();
        debug!(sql = %sql, binds = self.binds.len(), owns_transaction, "executing statement");

        match self.run(&sql, owns_transaction) {
            Ok(rows) => {
                if let Some(log) = &self.query_log {
                    log.log_query(&builder::render(&sql, &self.binds));
                }
                self.cleanup();
                Ok(rows)
            }
            Err(err) => {
                if self.connection.in_transaction() {
                    match self.connection.rollback() {
                        Ok(()) => warn!(sql = %sql, "transaction rolled back"),
                        Err(rollback_err) => {
                            warn!(sql = %sql, error = %rollback_err, "rollback failed");
                        }
                    }
                }
                error!(sql = %sql, error = %err, "statement failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, sql: &str, owns_transaction: bool) -> Result<Vec<Row>> {
        if owns_transaction {
            self.connection
                .begin_transaction()
                .map_err(|e| Error::backend(Stage::Begin, e))?;
        }

        let rows = {
            let mut statement = self
                .connection
                .prepare(sql)
                .map_err(|e| Error::backend(Stage::Prepare, e))?;
            for (position, value) in self.binds.iter() {
                statement
                    .bind_value(position, value)
                    .map_err(|e| Error::backend(Stage::Bind, e))?;
            }
            statement
                .execute()
                .map_err(|e| Error::backend(Stage::Execute, e))?;
            if is_ddl(sql) {
                Vec::new()
            } else {
                statement
                    .fetch_all()
                    .map_err(|e| Error::backend(Stage::Fetch, e))?
            }
        };

        if owns_transaction {
            self.connection
                .commit()
                .map_err(|e| Error::backend(Stage::Commit, e))?;
        }
        Ok(rows)
    }

    /// Executes generated DDL statements in order, stopping at the first
    /// failure.
    fn run_statements(&mut self, statements: Vec<Statement>) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for statement in statements {
            info!(sql = %statement.sql, "dispatching schema statement");
            rows = self.stage(statement).execute()?;
        }
        Ok(rows)
    }

    /// Creates `table`. Any staged statement is replaced.
    pub fn create_table(&mut self, table: &mut Table) -> Result<Vec<Row>> {
        let statements = SchemaBuilder.create_table(table, CreateMode::Plain)?;
        self.run_statements(statements)
    }

    /// Creates `table` unless it exists.
    pub fn create_table_if_not_exists(&mut self, table: &mut Table) -> Result<Vec<Row>> {
        let statements = SchemaBuilder.create_table(table, CreateMode::IfNotExists)?;
        self.run_statements(statements)
    }

    /// Drops `table` if it exists, then creates it.
    pub fn create_table_drop_if_exists(&mut self, table: &mut Table) -> Result<Vec<Row>> {
        let statements = SchemaBuilder.create_table(table, CreateMode::DropIfExists)?;
        self.run_statements(statements)
    }
}

impl<C: Connection + Introspect> Engine<C> {
    /// Reads the current columns of `table`.
    pub fn describe_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        self.connection
            .describe_columns(table)
            .map_err(|e| Error::backend(Stage::Introspect, e))
    }

    /// Generates the statements for `operation` without executing them,
    /// introspecting the table when the operation needs it.
    pub fn plan(&mut self, operation: &SchemaOperation, table: &mut Table) -> Result<Vec<Statement>> {
        let current = if operation.needs_introspection() {
            self.describe_columns(table.name())?
        } else {
            Vec::new()
        };
        SchemaBuilder.statements(operation, table, &current)
    }

    /// Generates and executes the statements for `operation`.
    pub fn apply(&mut self, operation: &SchemaOperation, table: &mut Table) -> Result<Vec<Row>> {
        let statements = self.plan(operation, table)?;
        self.run_statements(statements)
    }

    /// Applies the pending drops, changes and additions of `table`.
    pub fn alter_table(&mut self, table: &Table) -> Result<Vec<Row>> {
        let current = self.describe_columns(table.name())?;
        let statement = SchemaBuilder.alter_table(table, &current)?;
        self.run_statements(vec![statement])
    }

    /// Creates an index over the comma-separated `columns` of `table`.
    pub fn add_index(
        &mut self,
        table: &Table,
        name: &str,
        columns: &str,
        unique: bool,
    ) -> Result<&mut Self> {
        let current = self.describe_columns(table.name())?;
        let statement = SchemaBuilder.add_index(table, &current, name, columns, unique)?;
        self.run_statements(vec![statement])?;
        Ok(self)
    }
}
