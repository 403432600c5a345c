//! Descriptors: plain data describing the intended query or schema.

mod column;
mod resource;
mod table;

pub use column::{Column, DefaultValue, Flag, Length, Setting, SqlType};
pub use resource::{
    ColumnFilter, Condition, Direction, Expression, FilterValue, Join, JoinKind, Limit, OrderBy,
    Predicate, Resource,
};
pub use table::{
    ForeignKey, ForeignKeyAction, Table, DEFAULT_CHARSET, ENGINE_INNODB, ENGINE_MEMORY,
    ENGINE_MYISAM,
};
