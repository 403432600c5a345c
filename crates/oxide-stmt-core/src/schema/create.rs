//! CREATE TABLE generation.

use tracing::debug;

use super::{
    column_definition, declared_primary_key, foreign_key_clause, require_name, unknown_column,
    CreateMode, SchemaBuilder,
};
use crate::builder::Statement;
use crate::descriptor::Table;
use crate::error::{Error, Result};

impl SchemaBuilder {
    /// Generates CREATE TABLE, preceded by DROP TABLE IF EXISTS in
    /// [`CreateMode::DropIfExists`].
    ///
    /// The primary key, explicit or inferred from an AUTO_INCREMENT
    /// column, is recorded on `table` once generation succeeds.
    pub fn create_table(self, table: &mut Table, mode: CreateMode) -> Result<Vec<Statement>> {
        require_name(table)?;
        if table.engine_name().trim().is_empty() {
            return Err(Error::IncompleteSchema(format!(
                "table '{}' has no engine",
                table.name()
            )));
        }
        if table.columns().is_empty() {
            return Err(Error::IncompleteSchema(format!(
                "table '{}' has no columns",
                table.name()
            )));
        }

        let mut primary_key = declared_primary_key(table, table.columns());
        if let Some(pk) = &primary_key {
            if table.column(pk).is_none() {
                return Err(unknown_column(table, pk));
            }
        }
        for fk in table.foreign_keys() {
            if table.column(&fk.column).is_none() {
                return Err(unknown_column(table, &fk.column));
            }
        }

        let mut clauses = Vec::with_capacity(table.columns().len() + 1);
        for column in table.columns() {
            clauses.push(column_definition(column, &mut primary_key)?);
        }
        if let Some(pk) = &primary_key {
            clauses.push(format!("PRIMARY KEY({pk})"));
        }
        clauses.extend(table.foreign_keys().iter().map(foreign_key_clause));

        let if_not_exists = if mode == CreateMode::IfNotExists {
            "IF NOT EXISTS "
        } else {
            ""
        };
        let sql = format!(
            "CREATE TABLE {if_not_exists}{} ({}) ENGINE={} DEFAULT CHARSET={};",
            table.name(),
            clauses.join(", "),
            table.engine_name(),
            table.charset_name()
        );

        let mut statements = Vec::with_capacity(2);
        if mode == CreateMode::DropIfExists {
            statements.push(Statement::new(format!(
                "DROP TABLE IF EXISTS {};",
                table.name()
            )));
        }
        debug!(table = %table.name(), sql = %sql, "generated create table");
        statements.push(Statement::new(sql));

        if let Some(pk) = primary_key {
            table.set_primary_key(pk);
        }
        Ok(statements)
    }
}
