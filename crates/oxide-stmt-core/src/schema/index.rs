//! CREATE INDEX generation.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{require_name, unknown_column, SchemaBuilder};
use crate::builder::Statement;
use crate::descriptor::Table;
use crate::error::{Error, Result};
use crate::introspect::ColumnInfo;

/// Leading column name of an index entry such as `email(10)` or `id DESC`.
fn column_name(entry: &str) -> Option<&str> {
    static COLUMN_RE: OnceLock<Regex> = OnceLock::new();
    let re = COLUMN_RE
        .get_or_init(|| Regex::new(r"^([A-Za-z0-9_\-]+)").expect("valid index column regex"));
    re.captures(entry)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

impl SchemaBuilder {
    /// Generates `CREATE [UNIQUE] INDEX name ON table (columns);`.
    ///
    /// Every entry of the comma-separated `columns` must name a column of
    /// the descriptor or of the physical table (`current`).
    pub fn add_index(
        self,
        table: &Table,
        current: &[ColumnInfo],
        name: &str,
        columns: &str,
        unique: bool,
    ) -> Result<Statement> {
        require_name(table)?;
        if name.trim().is_empty() {
            return Err(Error::IncompleteSchema(format!(
                "index on table '{}' has no name",
                table.name()
            )));
        }

        let entries: Vec<&str> = columns
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect();
        if entries.is_empty() {
            return Err(Error::IncompleteSchema(format!(
                "index '{name}' has no columns"
            )));
        }

        for entry in &entries {
            let column = column_name(entry).ok_or_else(|| unknown_column(table, entry))?;
            let known = table.columns().iter().any(|c| c.name.eq_ignore_ascii_case(column))
                || current.iter().any(|c| c.name.eq_ignore_ascii_case(column));
            if !known {
                return Err(unknown_column(table, column));
            }
        }

        let sql = format!(
            "CREATE {}INDEX {} ON {} ({});",
            if unique { "UNIQUE " } else { "" },
            name.trim(),
            table.name(),
            entries.join(", ")
        );
        debug!(table = %table.name(), index = %name, sql = %sql, "generated index");
        Ok(Statement::new(sql))
    }
}
