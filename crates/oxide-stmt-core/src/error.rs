//! Error types for statement generation and execution.

use std::fmt;

/// Boxed error raised by a backend connection.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The execution step at which a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening a transaction.
    Begin,
    /// Preparing the statement text.
    Prepare,
    /// Binding a positional parameter.
    Bind,
    /// Executing the prepared statement.
    Execute,
    /// Fetching the result set.
    Fetch,
    /// Committing the transaction.
    Commit,
    /// Rolling back the transaction.
    Rollback,
    /// Reading column metadata for a table.
    Introspect,
}

impl Stage {
    /// Returns the stage name used in error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Prepare => "prepare",
            Self::Bind => "bind",
            Self::Execute => "execute",
            Self::Fetch => "fetch",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::Introspect => "introspect",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while building or executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `execute` was called with no staged statement.
    #[error("No statement staged; call build() or set_query() first")]
    NoStatement,

    /// A filter used an operator keyword that has no SQL mapping.
    #[error("Unsupported condition operator '{0}'")]
    UnsupportedCondition(String),

    /// A filter value does not fit its operator.
    #[error("Invalid value for operator '{operator}' on column '{column}'")]
    InvalidConditionValue {
        /// The operator keyword.
        operator: String,
        /// The filtered column.
        column: String,
    },

    /// A SELECT or DELETE descriptor with no projected columns.
    #[error("Query descriptor has no selected columns")]
    EmptyProjection,

    /// A table descriptor is missing its name, engine or columns.
    #[error("Incomplete schema: {0}")]
    IncompleteSchema(String),

    /// A column type that requires a length has none.
    #[error("Column '{column}' of type {sql_type} requires a length")]
    MissingLength {
        /// The column name.
        column: String,
        /// The SQL type name.
        sql_type: String,
    },

    /// Alter was requested on a table without introspectable columns.
    #[error("Table '{0}' has no columns")]
    EmptyTable(String),

    /// A drop, alter, key or index references a column that does not exist.
    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// The table name.
        table: String,
        /// The missing column.
        column: String,
    },

    /// A column is both dropped and altered in the same request.
    #[error("Column '{0}' cannot be dropped and altered at once")]
    ConflictingColumnChange(String),

    /// An alter declares a primary key on a table that already has another.
    #[error("Table '{table}' already has primary key '{existing}', cannot make '{requested}' the key")]
    PrimaryKeyExists {
        /// The table name.
        table: String,
        /// The current key column.
        existing: String,
        /// The key column the alter asked for.
        requested: String,
    },

    /// The backend connection failed.
    #[error("Backend error during {stage}: {source}")]
    Backend {
        /// The failing step.
        stage: Stage,
        /// The driver error.
        #[source]
        source: BackendError,
    },
}

impl Error {
    /// Wraps a driver error raised at `stage`.
    pub fn backend<E>(stage: Stage, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            stage,
            source: Box::new(source),
        }
    }

    /// Returns the failing stage for backend errors.
    #[must_use]
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            Self::Backend { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type for statement operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::MissingLength {
            column: String::from("name"),
            sql_type: String::from("VARCHAR"),
        };
        assert_eq!(
            err.to_string(),
            "Column 'name' of type VARCHAR requires a length"
        );

        let err = Error::UnknownColumn {
            table: String::from("users"),
            column: String::from("legacy"),
        };
        assert_eq!(err.to_string(), "Unknown column 'legacy' on table 'users'");
    }

    #[test]
    fn test_backend_error_keeps_stage_and_source() {
        let io = std::io::Error::other("gone away");
        let err = Error::backend(Stage::Execute, io);

        assert_eq!(err.stage(), Some(Stage::Execute));
        assert_eq!(err.to_string(), "Backend error during execute: gone away");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(Error::NoStatement.stage(), None);
    }
}
