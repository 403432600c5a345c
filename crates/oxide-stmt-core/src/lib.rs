//! # oxide-stmt-core
//!
//! Parameterized MySQL statement generation and transactional execution.
//!
//! This crate provides:
//! - Descriptors for queries ([`Resource`]) and schemas ([`Table`], [`Column`])
//! - A condition formatter that binds every filter value positionally
//! - Builders for SELECT/DELETE and for CREATE TABLE, ALTER TABLE and CREATE INDEX
//! - An [`Engine`] that runs staged statements inside transactions over any
//!   backend implementing [`Connection`]
//!
//! ## Building a query
//!
//! ```rust
//! use oxide_stmt_core::{Condition, Resource, SqlValue, StatementBuilder};
//!
//! let user_input = "'; DROP TABLE users; --";
//! let resource = Resource::new("users")
//!     .select(["id"])
//!     .filter("name", Condition::eq(user_input));
//! let stmt = StatementBuilder.build(&resource, false).unwrap();
//!
//! assert_eq!(stmt.sql, "SELECT id FROM users AS main_table WHERE (name = ?);");
//! assert_eq!(stmt.binds.values(), [SqlValue::Text(user_input.to_string())]);
//! ```
//!
//! ## Defining a table
//!
//! ```rust
//! use oxide_stmt_core::{Column, CreateMode, SchemaBuilder, SqlType, Table};
//!
//! let mut table = Table::new("users")
//!     .add_column(Column::new("id", SqlType::Int).length(10).unsigned().auto_increment())
//!     .add_column(Column::new("email", SqlType::Varchar).length(255).not_null());
//! let stmts = SchemaBuilder.create_table(&mut table, CreateMode::Plain).unwrap();
//!
//! assert_eq!(
//!     stmts[0].sql,
//!     "CREATE TABLE users (id INT(10) unsigned AUTO_INCREMENT, email VARCHAR(255) NOT NULL, \
//!      PRIMARY KEY(id)) ENGINE=InnoDB DEFAULT CHARSET=utf8;"
//! );
//! ```

pub mod builder;
pub mod condition;
pub mod connection;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod introspect;
pub mod log;
pub mod schema;
pub mod value;

pub use builder::{Statement, StatementBuilder};
pub use condition::{Bindings, ConditionFormatter, Operator};
pub use connection::{Connection, PreparedStatement};
pub use descriptor::{
    Column, ColumnFilter, Condition, DefaultValue, Direction, Expression, FilterValue, Flag,
    ForeignKey, ForeignKeyAction, Join, JoinKind, Length, Limit, OrderBy, Predicate, Resource,
    Setting, SqlType, Table,
};
pub use engine::Engine;
pub use error::{Error, Result, Stage};
pub use introspect::{ColumnInfo, Introspect};
pub use log::{QueryLog, TracingQueryLog};
pub use schema::{CreateMode, SchemaBuilder, SchemaOperation};
pub use value::{Row, SqlValue, ToSqlValue};
