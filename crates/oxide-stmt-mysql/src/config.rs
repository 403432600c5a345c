//! Connection settings.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::ConnectOptions;

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Default connect timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Where and how to connect.
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Default schema; empty for none.
    pub database: String,
    /// User name.
    pub user: String,
    /// Password; empty for none.
    pub password: String,
    /// Connect timeout in seconds.
    pub timeout_secs: u64,
    /// Log every executed statement on the `oxide_stmt::query` target.
    pub log_queries: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: DEFAULT_PORT,
            database: String::new(),
            user: String::from("root"),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_queries: false,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("log_queries", &self.log_queries)
            .finish()
    }
}

impl ConnectionConfig {
    /// `host:port`, as used in logs and timeout errors.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The connect timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Driver options for this configuration.
    ///
    /// The driver's own statement logging is disabled; the engine logs
    /// statements itself.
    #[must_use]
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        options.disable_statement_logging()
    }
}
