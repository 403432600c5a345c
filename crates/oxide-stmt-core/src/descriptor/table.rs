//! Table descriptor.

use serde::{Deserialize, Serialize};

use super::column::Column;

/// Default storage engine.
pub const ENGINE_INNODB: &str = "InnoDB";
/// In-memory storage engine.
pub const ENGINE_MEMORY: &str = "MEMORY";
/// Non-transactional storage engine.
pub const ENGINE_MYISAM: &str = "MyISAM";

/// Default character set.
pub const DEFAULT_CHARSET: &str = "utf8";

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key from one column of this table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// The referencing column on this table.
    pub column: String,
    /// The referenced table.
    pub references_table: String,
    /// The referenced column.
    pub references_column: String,
    /// ON UPDATE action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ForeignKeyAction>,
    /// ON DELETE action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Creates a foreign key with no referential actions.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

fn default_engine() -> String {
    String::from(ENGINE_INNODB)
}

fn default_charset() -> String {
    String::from(DEFAULT_CHARSET)
}

/// A table and its pending schema changes.
///
/// For creation only `columns`, the primary key and foreign keys matter.
/// For alteration, `columns` are the columns to add, alongside the drop
/// and change requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    #[serde(default = "default_engine")]
    engine: String,
    #[serde(default = "default_charset")]
    charset: String,
    #[serde(default)]
    columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dropped_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    altered_columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an InnoDB table with the default charset.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: default_engine(),
            charset: default_charset(),
            columns: Vec::new(),
            dropped_columns: Vec::new(),
            altered_columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
        }
    }

    /// Sets the storage engine.
    #[must_use]
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Adds a column. A column with the same name is replaced in place.
    #[must_use]
    pub fn add_column(mut self, column: Column) -> Self {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Requests a column drop. Cancels any pending change to it.
    #[must_use]
    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.altered_columns.retain(|c| c.name != name);
        if !self.dropped_columns.contains(&name) {
            self.dropped_columns.push(name);
        }
        self
    }

    /// Requests a column change. Cancels any pending drop of it.
    #[must_use]
    pub fn alter_column(mut self, column: Column) -> Self {
        self.dropped_columns.retain(|name| *name != column.name);
        match self
            .altered_columns
            .iter_mut()
            .find(|c| c.name == column.name)
        {
            Some(existing) => *existing = column,
            None => self.altered_columns.push(column),
        }
        self
    }

    /// Adds a foreign key. A key on the same column is replaced.
    #[must_use]
    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.foreign_keys.retain(|fk| fk.column != key.column);
        self.foreign_keys.push(key);
        self
    }

    /// Designates the primary key column.
    #[must_use]
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Designates the primary key column in place.
    pub fn set_primary_key(&mut self, column: impl Into<String>) {
        self.primary_key = Some(column.into());
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage engine.
    #[must_use]
    pub fn engine_name(&self) -> &str {
        &self.engine
    }

    /// Returns the character set.
    #[must_use]
    pub fn charset_name(&self) -> &str {
        &self.charset
    }

    /// Returns the columns to create or add.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column to create or add by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the requested drops.
    #[must_use]
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Returns the requested changes.
    #[must_use]
    pub fn altered_columns(&self) -> &[Column] {
        &self.altered_columns
    }

    /// Returns the primary key column, if designated.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Returns the foreign keys.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SqlType;

    #[test]
    fn test_table_defaults() {
        let table = Table::new("users");
        assert_eq!(table.name(), "users");
        assert_eq!(table.engine_name(), ENGINE_INNODB);
        assert_eq!(table.charset_name(), "utf8");
        assert!(table.columns().is_empty());
        assert_eq!(table.primary_key(), None);
    }

    #[test]
    fn test_add_column_replaces_same_name() {
        let table = Table::new("t")
            .add_column(Column::new("a", SqlType::Int).length(11))
            .add_column(Column::new("b", SqlType::Text))
            .add_column(Column::new("a", SqlType::BigInt).length(20));

        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(table.column("a").unwrap().sql_type, Some(SqlType::BigInt));
    }

    #[test]
    fn test_drop_and_alter_are_exclusive() {
        let table = Table::new("t")
            .alter_column(Column::alter("a").not_null())
            .drop_column("a");
        assert_eq!(table.dropped_columns(), ["a"]);
        assert!(table.altered_columns().is_empty());

        let table = table.alter_column(Column::alter("a").nullable());
        assert!(table.dropped_columns().is_empty());
        assert_eq!(table.altered_columns().len(), 1);
    }

    #[test]
    fn test_foreign_key_builder() {
        let table = Table::new("posts").foreign_key(
            ForeignKey::new("user_id", "users", "id")
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::SetNull),
        );
        let fk = &table.foreign_keys()[0];
        assert_eq!(fk.on_delete.map(ForeignKeyAction::as_sql), Some("CASCADE"));
        assert_eq!(fk.on_update.map(ForeignKeyAction::as_sql), Some("SET NULL"));
    }

    #[test]
    fn test_table_from_json() {
        let table: Table = serde_json::from_str(
            r#"{
                "name": "sessions",
                "engine": "MEMORY",
                "columns": [
                    {"name": "id", "type": "INT", "length": 11, "auto_increment": true},
                    {"name": "token", "type": "CHAR", "length": 64}
                ],
                "foreign_keys": [
                    {"column": "id", "references_table": "users", "references_column": "id", "on_delete": "cascade"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(table.engine_name(), ENGINE_MEMORY);
        assert_eq!(table.charset_name(), "utf8");
        assert_eq!(table.columns().len(), 2);
        assert_eq!(
            table.foreign_keys()[0].on_delete,
            Some(ForeignKeyAction::Cascade)
        );
    }
}
