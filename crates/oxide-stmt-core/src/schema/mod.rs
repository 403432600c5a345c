//! DDL generation: CREATE TABLE, ALTER TABLE and CREATE INDEX.
//!
//! Every operation validates the whole request before producing any
//! text, so a failing column never leaves a partial statement behind.

mod alter;
mod create;
mod index;

use serde::{Deserialize, Serialize};

use crate::builder::Statement;
use crate::descriptor::{Column, Flag, ForeignKey, Setting, Table};
use crate::error::{Error, Result};
use crate::introspect::ColumnInfo;
use crate::value::quote_literal;

/// How CREATE TABLE treats an existing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateMode {
    /// Plain CREATE TABLE; fails if the table exists.
    #[default]
    Plain,
    /// CREATE TABLE IF NOT EXISTS.
    IfNotExists,
    /// DROP TABLE IF EXISTS, then CREATE TABLE.
    DropIfExists,
}

/// A schema change to generate DDL for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum SchemaOperation {
    /// Create the table from its columns, primary key and foreign keys.
    CreateTable {
        /// Existing-table policy.
        #[serde(default)]
        mode: CreateMode,
    },
    /// Apply pending drops, changes and additions.
    AlterTable,
    /// Create an index.
    AddIndex {
        /// Index name.
        name: String,
        /// Comma-separated column list, entries may carry a prefix length.
        columns: String,
        /// Whether the index is UNIQUE.
        #[serde(default)]
        unique: bool,
    },
}

impl SchemaOperation {
    /// Whether generating this operation needs the table's current columns.
    #[must_use]
    pub const fn needs_introspection(&self) -> bool {
        matches!(self, Self::AlterTable | Self::AddIndex { .. })
    }
}

/// Generates DDL statements from table descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaBuilder;

impl SchemaBuilder {
    /// Generates the ordered statements for an operation.
    ///
    /// `current` is the introspected column list of the physical table;
    /// it is ignored by [`SchemaOperation::CreateTable`]. A primary key
    /// inferred while creating is recorded on `table`.
    pub fn statements(
        self,
        operation: &SchemaOperation,
        table: &mut Table,
        current: &[ColumnInfo],
    ) -> Result<Vec<Statement>> {
        match operation {
            SchemaOperation::CreateTable { mode } => self.create_table(table, *mode),
            SchemaOperation::AlterTable => Ok(vec![self.alter_table(table, current)?]),
            SchemaOperation::AddIndex {
                name,
                columns,
                unique,
            } => Ok(vec![self.add_index(table, current, name, columns, *unique)?]),
        }
    }
}

/// Renders `TYPE[(length)]`, applying the length policy.
fn column_type(column: &Column) -> Result<String> {
    let Some(sql_type) = column.sql_type else {
        return Err(Error::IncompleteSchema(format!(
            "column '{}' has no type",
            column.name
        )));
    };
    if !sql_type.takes_length() {
        return Ok(String::from(sql_type.as_sql()));
    }
    match &column.length {
        Some(length) => Ok(format!("{sql_type}({length})")),
        None => Err(Error::MissingLength {
            column: column.name.clone(),
            sql_type: String::from(sql_type.as_sql()),
        }),
    }
}

/// Renders a column definition as used by CREATE TABLE and ALTER ... ADD.
///
/// `primary_key` is the key assigned so far; a column marked
/// AUTO_INCREMENT claims it when it is still free.
fn column_definition(column: &Column, primary_key: &mut Option<String>) -> Result<String> {
    let mut sql = format!("{} {}", column.name, column_type(column)?);

    if column.unsigned.is_on() {
        sql.push_str(" unsigned");
    }
    if column.not_null.is_on() {
        sql.push_str(" NOT NULL");
    }

    let auto_increment = match primary_key.as_deref() {
        Some(pk) => pk == column.name && column.auto_increment != Flag::Off,
        None => column.auto_increment.is_on(),
    };
    if auto_increment {
        if primary_key.is_none() {
            *primary_key = Some(column.name.clone());
        }
        sql.push_str(" AUTO_INCREMENT");
    }

    if column.zerofill.is_on() {
        sql.push_str(" ZEROFILL");
    }
    if let Setting::Set(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default.to_sql());
    }
    if let Some(on_update) = &column.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(on_update);
    }
    if let Setting::Set(comment) = &column.comment {
        sql.push_str(&format!(" COMMENT {}", quote(comment)));
    }
    Ok(sql)
}

/// The primary key named by column flags, falling back to the table's.
fn declared_primary_key(table: &Table, columns: &[Column]) -> Option<String> {
    columns
        .iter()
        .rev()
        .find(|c| c.primary_key.is_on())
        .map(|c| c.name.clone())
        .or_else(|| table.primary_key().map(String::from))
}

fn foreign_key_clause(fk: &ForeignKey) -> String {
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        fk.column, fk.references_table, fk.references_column
    );
    if let Some(action) = fk.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = fk.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    sql
}

/// Double-quotes a string literal.
fn quote(value: &str) -> String {
    quote_literal(value, '"')
}

fn unknown_column(table: &Table, column: &str) -> Error {
    Error::UnknownColumn {
        table: String::from(table.name()),
        column: String::from(column),
    }
}

fn require_name(table: &Table) -> Result<()> {
    if table.name().trim().is_empty() {
        return Err(Error::IncompleteSchema(String::from("table has no name")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SqlType;

    #[test]
    fn test_text_never_takes_length() {
        let col = Column::new("body", SqlType::Text).length(255);
        let mut pk = None;
        assert_eq!(column_definition(&col, &mut pk).unwrap(), "body TEXT");
    }

    #[test]
    fn test_varchar_requires_length() {
        let col = Column::new("name", SqlType::Varchar);
        let err = column_definition(&col, &mut None).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingLength { ref column, ref sql_type } if column == "name" && sql_type == "VARCHAR"
        ));
    }

    #[test]
    fn test_full_definition_order() {
        let col = Column::new("updated_at", SqlType::Timestamp)
            .not_null()
            .default_value("current_timestamp()")
            .on_update("current_timestamp()")
            .comment("last \"touch\"");
        assert_eq!(
            column_definition(&col, &mut Some(String::from("id"))).unwrap(),
            "updated_at TIMESTAMP NOT NULL DEFAULT current_timestamp() \
             ON UPDATE current_timestamp() COMMENT \"last \"\"touch\"\"\""
        );

        let col = Column::new("qty", SqlType::Int)
            .length(10)
            .unsigned()
            .zerofill()
            .default_value("0");
        assert_eq!(
            column_definition(&col, &mut Some(String::from("id"))).unwrap(),
            "qty INT(10) unsigned ZEROFILL DEFAULT \"0\""
        );
    }

    #[test]
    fn test_auto_increment_claims_free_primary_key() {
        let a = Column::new("a", SqlType::Int).length(11).auto_increment();
        let b = Column::new("b", SqlType::Int).length(11).auto_increment();
        let mut pk = None;

        assert_eq!(
            column_definition(&a, &mut pk).unwrap(),
            "a INT(11) AUTO_INCREMENT"
        );
        assert_eq!(pk.as_deref(), Some("a"));
        assert_eq!(column_definition(&b, &mut pk).unwrap(), "b INT(11)");
    }

    #[test]
    fn test_designated_primary_key_gets_auto_increment() {
        let id = Column::new("id", SqlType::BigInt).length(20);
        let mut pk = Some(String::from("id"));
        assert_eq!(
            column_definition(&id, &mut pk).unwrap(),
            "id BIGINT(20) AUTO_INCREMENT"
        );

        let code = Column::new("code", SqlType::Char).length(3);
        let code = Column {
            auto_increment: Flag::Off,
            ..code
        };
        let mut pk = Some(String::from("code"));
        assert_eq!(column_definition(&code, &mut pk).unwrap(), "code CHAR(3)");
    }

    #[test]
    fn test_operation_from_json() {
        let op: SchemaOperation = serde_json::from_str(
            r#"{"operation": "add_index", "name": "idx_email", "columns": "email(10)", "unique": true}"#,
        )
        .unwrap();
        assert!(op.needs_introspection());

        let op: SchemaOperation =
            serde_json::from_str(r#"{"operation": "create_table"}"#).unwrap();
        assert_eq!(
            op,
            SchemaOperation::CreateTable {
                mode: CreateMode::Plain
            }
        );
    }
}
