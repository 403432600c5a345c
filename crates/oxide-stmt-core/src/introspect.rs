//! Schema introspection trait.
//!
//! Backend crates (oxide-stmt-mysql, etc.) implement [`Introspect`] to
//! read the current columns of a table. The alter and index paths use it
//! to validate requests against the physical table.

use serde::{Deserialize, Serialize};

use crate::value::Row;

/// Metadata of one existing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Full type string, e.g. `int(10) unsigned`.
    pub column_type: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Key role: `PRI`, `UNI`, `MUL` or empty.
    pub key: String,
    /// Default value, if any.
    pub default: Option<String>,
    /// Extra flags, e.g. `auto_increment`.
    pub extra: String,
}

impl ColumnInfo {
    /// Parses a `SHOW [FULL] COLUMNS` row
    /// (`Field, Type, Null, Key, Default, Extra`).
    ///
    /// Returns `None` if the row has no `Field`.
    #[must_use]
    pub fn from_show_columns_row(row: &Row) -> Option<Self> {
        let text = |column: &str| row.get_text(column).unwrap_or_default();
        let name = row.get_text("Field")?;
        Some(Self {
            name,
            column_type: text("Type"),
            nullable: text("Null").eq_ignore_ascii_case("YES"),
            key: text("Key"),
            default: row.get_text("Default"),
            extra: text("Extra"),
        })
    }

    /// Whether this column is the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.key == "PRI"
    }

    /// Whether this column auto-increments.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// Reads the current column metadata of a table.
///
/// Implementations live in backend crates (e.g. oxide-stmt-mysql).
pub trait Introspect {
    /// Error type for introspection failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the columns of `table` in table order. A missing table
    /// yields an empty list or an error, depending on the backend.
    fn describe_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[test]
    fn test_from_show_columns_row() {
        let row: Row = vec![
            ("Field", text("id")),
            ("Type", text("int(10) unsigned")),
            ("Collation", SqlValue::Null),
            ("Null", text("NO")),
            ("Key", text("PRI")),
            ("Default", SqlValue::Null),
            ("Extra", text("auto_increment")),
        ]
        .into_iter()
        .collect();

        let info = ColumnInfo::from_show_columns_row(&row).unwrap();
        assert_eq!(info.name, "id");
        assert_eq!(info.column_type, "int(10) unsigned");
        assert!(!info.nullable);
        assert!(info.is_primary_key());
        assert!(info.is_auto_increment());
        assert_eq!(info.default, None);
    }

    #[test]
    fn test_from_show_columns_row_blob_values() {
        let row: Row = vec![
            ("Field", SqlValue::Blob(b"note".to_vec())),
            ("Type", SqlValue::Blob(b"text".to_vec())),
            ("Null", SqlValue::Blob(b"YES".to_vec())),
            ("Key", text("")),
            ("Default", text("n/a")),
            ("Extra", text("")),
        ]
        .into_iter()
        .collect();

        let info = ColumnInfo::from_show_columns_row(&row).unwrap();
        assert_eq!(info.name, "note");
        assert!(info.nullable);
        assert_eq!(info.default.as_deref(), Some("n/a"));
        assert!(!info.is_primary_key());
    }

    #[test]
    fn test_row_without_field_is_skipped() {
        let row: Row = vec![("Type", text("int"))].into_iter().collect();
        assert!(ColumnInfo::from_show_columns_row(&row).is_none());
    }
}
