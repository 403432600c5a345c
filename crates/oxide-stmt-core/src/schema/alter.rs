//! ALTER TABLE generation.

use tracing::debug;

use super::{
    column_definition, column_type, declared_primary_key, foreign_key_clause, quote,
    require_name, unknown_column, SchemaBuilder,
};
use crate::builder::Statement;
use crate::descriptor::{Column, Flag, Setting, Table};
use crate::error::{Error, Result};
use crate::introspect::ColumnInfo;

fn find<'a>(current: &'a [ColumnInfo], name: &str) -> Option<&'a ColumnInfo> {
    current.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

impl SchemaBuilder {
    /// Generates one ALTER TABLE statement applying, in order, the pending
    /// drops, column changes, added columns and foreign keys of `table`.
    ///
    /// `current` is the introspected column list of the physical table.
    pub fn alter_table(self, table: &Table, current: &[ColumnInfo]) -> Result<Statement> {
        require_name(table)?;
        if current.is_empty() {
            return Err(Error::EmptyTable(String::from(table.name())));
        }

        for name in table.dropped_columns() {
            if table
                .altered_columns()
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(name))
            {
                return Err(Error::ConflictingColumnChange(name.clone()));
            }
            if find(current, name).is_none() {
                return Err(unknown_column(table, name));
            }
        }

        let mut clauses = Vec::new();
        for name in table.dropped_columns() {
            clauses.push(format!("DROP COLUMN {name}"));
        }
        for column in table.altered_columns() {
            let Some(info) = find(current, &column.name) else {
                return Err(unknown_column(table, &column.name));
            };
            clauses.push(change_clause(column, info)?);
        }

        let existing_pk = current
            .iter()
            .find(|c| c.is_primary_key())
            .map(|c| c.name.clone());
        let declared = declared_primary_key(table, table.columns());
        // Only the existing key column may be (re)declared.
        if let (Some(existing), Some(requested)) = (&existing_pk, &declared) {
            if !existing.eq_ignore_ascii_case(requested) {
                return Err(Error::PrimaryKeyExists {
                    table: String::from(table.name()),
                    existing: existing.clone(),
                    requested: requested.clone(),
                });
            }
        }
        let mut primary_key = existing_pk.clone().or(declared);
        for column in table.columns() {
            clauses.push(format!("ADD {}", column_definition(column, &mut primary_key)?));
        }

        let exists = |name: &str| find(current, name).is_some() || table.column(name).is_some();
        if existing_pk.is_none() {
            if let Some(pk) = &primary_key {
                if !exists(pk) {
                    return Err(unknown_column(table, pk));
                }
                clauses.push(format!("ADD PRIMARY KEY({pk})"));
            }
        }
        for fk in table.foreign_keys() {
            if !exists(&fk.column) {
                return Err(unknown_column(table, &fk.column));
            }
            clauses.push(format!("ADD {}", foreign_key_clause(fk)));
        }

        if clauses.is_empty() {
            return Err(Error::IncompleteSchema(format!(
                "no changes requested for table '{}'",
                table.name()
            )));
        }

        let sql = format!("ALTER TABLE {} {};", table.name(), clauses.join(", "));
        debug!(table = %table.name(), sql = %sql, "generated alter table");
        Ok(Statement::new(sql))
    }
}

/// Renders `CHANGE COLUMN old new TYPE ...`.
///
/// MySQL needs the full type in a CHANGE; without a new type the
/// introspected one is kept.
fn change_clause(column: &Column, info: &ColumnInfo) -> Result<String> {
    let new_name = column.rename_to.as_deref().unwrap_or(&column.name);
    let sql_type = if column.sql_type.is_some() {
        column_type(column)?
    } else {
        info.column_type.clone()
    };

    let mut sql = format!("CHANGE COLUMN {} {new_name} {sql_type}", info.name);
    if column.unsigned.is_on() && !sql_type.to_ascii_lowercase().contains("unsigned") {
        sql.push_str(" unsigned");
    }
    match column.not_null {
        Flag::On => sql.push_str(" NOT NULL"),
        Flag::Off => sql.push_str(" NULL"),
        Flag::Unset => {}
    }
    if column.auto_increment.is_on() {
        sql.push_str(" AUTO_INCREMENT");
    }
    match column.zerofill {
        Flag::On => sql.push_str(" ZEROFILL"),
        Flag::Off => sql.push_str(" DROP ZEROFILL"),
        Flag::Unset => {}
    }
    match &column.default {
        Setting::Set(default) => {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }
        Setting::Clear => sql.push_str(" DROP DEFAULT"),
        Setting::Unset => {}
    }
    if let Some(on_update) = &column.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(on_update);
    }
    match &column.comment {
        Setting::Set(comment) => sql.push_str(&format!(" COMMENT {}", quote(comment))),
        Setting::Clear => sql.push_str(" COMMENT \"\""),
        Setting::Unset => {}
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ForeignKey, SqlType};

    fn info(name: &str, column_type: &str, key: &str) -> ColumnInfo {
        ColumnInfo {
            name: String::from(name),
            column_type: String::from(column_type),
            nullable: key.is_empty(),
            key: String::from(key),
            default: None,
            extra: String::new(),
        }
    }

    fn current() -> Vec<ColumnInfo> {
        vec![
            info("id", "int(10) unsigned", "PRI"),
            info("name", "varchar(64)", ""),
            info("legacy", "text", ""),
            info("status", "tinyint(1)", ""),
        ]
    }

    #[test]
    fn test_alter_clause_order() {
        let table = Table::new("users")
            .drop_column("legacy")
            .alter_column(
                Column::alter("name")
                    .change_type(SqlType::Varchar)
                    .length(128)
                    .not_null()
                    .default_value("anon"),
            )
            .add_column(Column::new("email", SqlType::Varchar).length(255));

        let stmt = SchemaBuilder.alter_table(&table, &current()).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE users DROP COLUMN legacy, \
             CHANGE COLUMN name name VARCHAR(128) NOT NULL DEFAULT \"anon\", \
             ADD email VARCHAR(255);"
        );
    }

    #[test]
    fn test_change_tri_state_removals() {
        let table = Table::new("users").alter_column(
            Column::alter("status")
                .rename_to("state")
                .nullable()
                .drop_zerofill()
                .drop_default()
                .clear_comment(),
        );

        let stmt = SchemaBuilder.alter_table(&table, &current()).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE users CHANGE COLUMN status state tinyint(1) NULL \
             DROP ZEROFILL DROP DEFAULT COMMENT \"\";"
        );
    }

    #[test]
    fn test_change_keeps_introspected_unsigned() {
        let table = Table::new("users").alter_column(Column::alter("id").unsigned().auto_increment());
        let stmt = SchemaBuilder.alter_table(&table, &current()).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE users CHANGE COLUMN id id int(10) unsigned AUTO_INCREMENT;"
        );
    }

    #[test]
    fn test_drop_unknown_column() {
        let table = Table::new("users").drop_column("ghost");
        let err = SchemaBuilder.alter_table(&table, &current()).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { ref column, .. } if column == "ghost"));
    }

    #[test]
    fn test_alter_unknown_column() {
        let table = Table::new("users").alter_column(Column::alter("ghost").not_null());
        let err = SchemaBuilder.alter_table(&table, &current()).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new("users").drop_column("legacy");
        let err = SchemaBuilder.alter_table(&table, &[]).unwrap_err();
        assert!(matches!(err, Error::EmptyTable(ref t) if t == "users"));
    }

    #[test]
    fn test_nothing_to_do() {
        let err = SchemaBuilder
            .alter_table(&Table::new("users"), &current())
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteSchema(_)));
    }

    #[test]
    fn test_added_column_respects_existing_primary_key() {
        let table = Table::new("users").add_column(
            Column::new("counter", SqlType::Int)
                .length(11)
                .auto_increment(),
        );
        let stmt = SchemaBuilder.alter_table(&table, &current()).unwrap();
        assert_eq!(stmt.sql, "ALTER TABLE users ADD counter INT(11);");
    }

    #[test]
    fn test_added_auto_increment_becomes_primary_key() {
        let current = vec![info("name", "varchar(64)", "")];
        let table = Table::new("tags").add_column(
            Column::new("id", SqlType::Int)
                .length(11)
                .not_null()
                .auto_increment(),
        );
        let stmt = SchemaBuilder.alter_table(&table, &current).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE tags ADD id INT(11) NOT NULL AUTO_INCREMENT, ADD PRIMARY KEY(id);"
        );
    }

    #[test]
    fn test_second_primary_key_is_rejected() {
        let current = vec![ColumnInfo {
            extra: String::from("auto_increment"),
            ..info("id", "int(11)", "PRI")
        }];
        let table = Table::new("users")
            .add_column(Column::new("code", SqlType::Int).length(11).primary_key());
        let err = SchemaBuilder.alter_table(&table, &current).unwrap_err();
        assert!(matches!(
            err,
            Error::PrimaryKeyExists { ref existing, ref requested, .. }
                if existing == "id" && requested == "code"
        ));

        let table = Table::new("users").with_primary_key("code").add_column(
            Column::new("code", SqlType::Int).length(11).auto_increment(),
        );
        assert!(matches!(
            SchemaBuilder.alter_table(&table, &current),
            Err(Error::PrimaryKeyExists { .. })
        ));
    }

    #[test]
    fn test_redeclaring_existing_primary_key_adds_no_key() {
        let current = vec![info("ID", "int(11)", "PRI")];
        let table = Table::new("users")
            .with_primary_key("id")
            .add_column(Column::new("name", SqlType::Varchar).length(64));
        let stmt = SchemaBuilder.alter_table(&table, &current).unwrap();
        assert_eq!(stmt.sql, "ALTER TABLE users ADD name VARCHAR(64);");
    }

    #[test]
    fn test_drop_and_alter_conflict_ignores_case() {
        let table = Table::new("users")
            .drop_column("Legacy")
            .alter_column(Column::alter("legacy").not_null());
        let err = SchemaBuilder.alter_table(&table, &current()).unwrap_err();
        assert!(matches!(err, Error::ConflictingColumnChange(ref c) if c == "Legacy"));
    }

    #[test]
    fn test_add_foreign_key() {
        let table = Table::new("users")
            .add_column(Column::new("team_id", SqlType::Int).length(11))
            .foreign_key(ForeignKey::new("team_id", "teams", "id"));
        let stmt = SchemaBuilder.alter_table(&table, &current()).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE users ADD team_id INT(11), \
             ADD FOREIGN KEY (team_id) REFERENCES teams(id);"
        );
    }

    #[test]
    fn test_missing_length_on_change_fails_whole_statement() {
        let table = Table::new("users")
            .drop_column("legacy")
            .alter_column(Column::alter("name").change_type(SqlType::Varchar));
        let err = SchemaBuilder.alter_table(&table, &current()).unwrap_err();
        assert!(matches!(err, Error::MissingLength { .. }));
    }
}
