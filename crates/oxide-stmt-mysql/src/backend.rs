//! Blocking MySQL connection.
//!
//! [`MySqlBackend`] drives one `sqlx` connection on a private
//! current-thread runtime, so every call blocks until the server answers.

use std::str::FromStr;
use std::time::Duration;

use oxide_stmt_core::{ColumnInfo, Connection, Introspect, PreparedStatement, Row, SqlValue};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, Connection as _, Executor};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use crate::config::ConnectionConfig;
use crate::decode::decode_row;
use crate::error::{MySqlError, Result};

/// SQLSTATE for "table does not exist".
const NO_SUCH_TABLE: &str = "42S02";

/// A blocking MySQL connection implementing [`Connection`] and [`Introspect`].
pub struct MySqlBackend {
    runtime: Runtime,
    conn: MySqlConnection,
    in_transaction: bool,
}

impl MySqlBackend {
    /// Connects using `config`, giving up after its timeout.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let backend = Self::connect_with(&config.connect_options(), config.timeout())?;
        info!(address = %config.address(), database = %config.database, "connected to MySQL");
        Ok(backend)
    }

    /// Connects using a `mysql://` URL.
    pub fn connect_url(url: &str, timeout: Duration) -> Result<Self> {
        let options = MySqlConnectOptions::from_str(url)?.disable_statement_logging();
        Self::connect_with(&options, timeout)
    }

    /// Connects using driver options.
    pub fn connect_with(options: &MySqlConnectOptions, timeout: Duration) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let conn = runtime
            .block_on(async { tokio::time::timeout(timeout, options.connect()).await })
            .map_err(|_| MySqlError::ConnectTimeout {
                address: format!("{}:{}", options.get_host(), options.get_port()),
                seconds: timeout.as_secs(),
            })??;
        Ok(Self {
            runtime,
            conn,
            in_transaction: false,
        })
    }

    /// Closes the connection gracefully.
    pub fn close(self) -> Result<()> {
        let Self { runtime, conn, .. } = self;
        runtime.block_on(conn.close())?;
        Ok(())
    }

    /// Runs a statement over the text protocol.
    fn run_simple(&mut self, sql: &str) -> Result<()> {
        debug!(sql = %sql, "mysql simple statement");
        self.runtime.block_on(self.conn.execute(sql))?;
        Ok(())
    }
}

impl std::fmt::Debug for MySqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlBackend")
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl Connection for MySqlBackend {
    type Error = MySqlError;
    type Statement<'c> = MySqlStatement<'c>;

    fn begin_transaction(&mut self) -> Result<()> {
        self.run_simple("START TRANSACTION")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let result = self.run_simple("COMMIT");
        self.in_transaction = false;
        result
    }

    fn rollback(&mut self) -> Result<()> {
        let result = self.run_simple("ROLLBACK");
        self.in_transaction = false;
        result
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn prepare(&mut self, sql: &str) -> Result<MySqlStatement<'_>> {
        let sql = sql.trim_end().trim_end_matches(';').to_string();
        // Server-side preparation happens on first execution; sqlx caches it.
        Ok(MySqlStatement {
            backend: self,
            sql,
            params: Vec::new(),
            rows: Vec::new(),
        })
    }
}

/// A statement staged on a [`MySqlBackend`].
pub struct MySqlStatement<'c> {
    backend: &'c mut MySqlBackend,
    sql: String,
    params: Vec<Option<SqlValue>>,
    rows: Vec<MySqlRow>,
}

impl PreparedStatement for MySqlStatement<'_> {
    type Error = MySqlError;

    fn bind_value(&mut self, position: usize, value: &SqlValue) -> Result<()> {
        if position == 0 {
            return Err(MySqlError::UnboundParameter(0));
        }
        if self.params.len() < position {
            self.params.resize(position, None);
        }
        self.params[position - 1] = Some(value.clone());
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        let mut query = sqlx::query(&self.sql);
        for (index, param) in self.params.iter().enumerate() {
            let value = param
                .as_ref()
                .ok_or(MySqlError::UnboundParameter(index + 1))?;
            query = bind_param(query, value);
        }
        let backend = &mut *self.backend;
        self.rows = backend.runtime.block_on(query.fetch_all(&mut backend.conn))?;
        Ok(())
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        std::mem::take(&mut self.rows).iter().map(decode_row).collect()
    }
}

/// Binds a SqlValue parameter to a query.
fn bind_param<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}

/// Backtick-quotes a table name, allowing one `schema.` prefix.
fn quote_table(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split('.').collect();
    let valid = parts.len() <= 2
        && parts.iter().all(|p| {
            !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        });
    if !valid {
        return Err(MySqlError::InvalidIdentifier(String::from(name)));
    }
    Ok(parts
        .iter()
        .map(|p| format!("`{p}`"))
        .collect::<Vec<_>>()
        .join("."))
}

impl Introspect for MySqlBackend {
    type Error = MySqlError;

    /// Runs `SHOW FULL COLUMNS FROM table`. A missing table yields no columns.
    fn describe_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let sql = format!("SHOW FULL COLUMNS FROM {}", quote_table(table)?);
        debug!(sql = %sql, "introspecting table");

        let fetched = self.runtime.block_on(self.conn.fetch_all(sql.as_str()));
        let rows = match fetched {
            Ok(rows) => rows,
            Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some(NO_SUCH_TABLE) => {
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(info) = ColumnInfo::from_show_columns_row(&decode_row(row)?) {
                columns.push(info);
            }
        }
        Ok(columns)
    }
}
