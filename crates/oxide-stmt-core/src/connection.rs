//! Backend connection traits.
//!
//! The engine drives a database through these traits only. They are
//! blocking: every call returns once the backend has answered.

use crate::value::{Row, SqlValue};

/// A connection able to run prepared statements inside transactions.
pub trait Connection {
    /// Error type for backend failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A statement prepared on this connection.
    type Statement<'c>: PreparedStatement<Error = Self::Error>
    where
        Self: 'c;

    /// Opens a transaction.
    fn begin_transaction(&mut self) -> Result<(), Self::Error>;

    /// Commits the open transaction.
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Rolls back the open transaction.
    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Whether a transaction is open.
    fn in_transaction(&self) -> bool;

    /// Prepares SQL text with `?` placeholders.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement<'_>, Self::Error>;
}

/// A prepared statement.
pub trait PreparedStatement {
    /// Error type for backend failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Binds a value to a 1-based placeholder position.
    fn bind_value(&mut self, position: usize, value: &SqlValue) -> Result<(), Self::Error>;

    /// Executes the statement.
    fn execute(&mut self) -> Result<(), Self::Error>;

    /// Returns all rows produced by the last execution.
    fn fetch_all(&mut self) -> Result<Vec<Row>, Self::Error>;
}
