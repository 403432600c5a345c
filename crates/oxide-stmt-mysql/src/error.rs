//! Error types for the MySQL backend.

/// Errors raised by the MySQL backend.
#[derive(Debug, thiserror::Error)]
pub enum MySqlError {
    /// Error reported by the driver or the server.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The server did not accept the connection in time.
    #[error("Connection to {address} timed out after {seconds}s")]
    ConnectTimeout {
        /// `host:port` that was dialed.
        address: String,
        /// Configured timeout.
        seconds: u64,
    },

    /// The blocking runtime could not be started.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// A result column could not be converted to a value.
    #[error("Cannot decode column '{column}' of type {type_name}: {source}")]
    Decode {
        /// Column label.
        column: String,
        /// Server type name.
        type_name: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A placeholder position was left without a value.
    #[error("Placeholder {0} has no bound value")]
    UnboundParameter(usize),

    /// A table name that cannot be quoted safely.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, MySqlError>;
