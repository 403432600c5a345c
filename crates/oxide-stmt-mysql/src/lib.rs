//! # oxide-stmt-mysql
//!
//! MySQL backend for `oxide-stmt-core`.
//!
//! [`MySqlBackend`] implements the engine's blocking
//! [`Connection`](oxide_stmt_core::Connection) and
//! [`Introspect`](oxide_stmt_core::Introspect) traits over one `sqlx`
//! connection. Placeholders are bound server-side, result sets are fully
//! buffered and every row is decoded into an ordered
//! [`Row`](oxide_stmt_core::Row).
//!
//! ```rust,no_run
//! use oxide_stmt_core::{Condition, Engine, Resource};
//! use oxide_stmt_mysql::{ConnectionConfig, MySqlBackend};
//!
//! let config = ConnectionConfig {
//!     database: String::from("shop"),
//!     ..ConnectionConfig::default()
//! };
//! let mut engine = Engine::new(MySqlBackend::connect(&config)?);
//! let rows = engine
//!     .build(
//!         &Resource::new("orders")
//!             .select(["id", "total"])
//!             .filter("status", Condition::eq("paid")),
//!         false,
//!     )?
//!     .execute()?;
//! println!("{} paid orders", rows.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod config;
pub mod decode;
pub mod error;

pub use backend::{MySqlBackend, MySqlStatement};
pub use config::{ConnectionConfig, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
pub use decode::{classify, decode_row, ValueKind};
pub use error::{MySqlError, Result};
