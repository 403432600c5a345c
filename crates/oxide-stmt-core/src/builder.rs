//! SELECT and DELETE statement building.

use tracing::debug;

use crate::condition::{Bindings, ConditionFormatter};
use crate::descriptor::Resource;
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// Alias given to the target table.
pub const MAIN_TABLE_ALIAS: &str = "main_table";

/// SQL text with `?` placeholders and the values bound to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound values in placeholder order.
    pub binds: Bindings,
}

impl Statement {
    /// Creates a statement with no bound values.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Bindings::new(),
        }
    }

    /// Creates a statement with bound values.
    #[must_use]
    pub fn with_binds(sql: impl Into<String>, binds: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            binds: Bindings::from(binds),
        }
    }

    /// Renders the SQL with each placeholder replaced, in order, by its
    /// escaped value. For logs only; execution always binds.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.sql, &self.binds)
    }
}

/// Substitutes placeholders in `sql` with the inline form of `binds`.
///
/// Placeholders beyond the bound values are left as `?`.
#[must_use]
pub fn render(sql: &str, binds: &Bindings) -> String {
    let mut values = binds.values().iter();
    let mut out = String::with_capacity(sql.len());
    for ch in sql.chars() {
        if ch != '?' {
            out.push(ch);
            continue;
        }
        match values.next() {
            Some(v) => out.push_str(&v.to_sql_inline()),
            None => out.push('?'),
        }
    }
    out
}

/// Builds SELECT and DELETE statements from query descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementBuilder;

impl StatementBuilder {
    /// Builds a SELECT, or a DELETE when `delete` is set.
    ///
    /// ```
    /// use oxide_stmt_core::{Condition, Direction, Resource, StatementBuilder};
    ///
    /// let resource = Resource::new("users")
    ///     .select(["id", "name"])
    ///     .filter("age", Condition::gteq(18))
    ///     .order_by("id", Direction::Asc)
    ///     .limit(0, 10);
    /// let stmt = StatementBuilder.build(&resource, false).unwrap();
    /// assert_eq!(
    ///     stmt.sql,
    ///     "SELECT id, name FROM users AS main_table WHERE (age >= ?) ORDER BY id ASC LIMIT 0, 10;"
    /// );
    /// ```
    pub fn build(self, resource: &Resource, delete: bool) -> Result<Statement> {
        if resource.table.is_empty() {
            return Err(Error::IncompleteSchema(String::from(
                "query descriptor has no table",
            )));
        }
        if resource.select.is_empty() {
            return Err(Error::EmptyProjection);
        }

        let mut binds = Bindings::new();
        let mut sql = String::from(if delete { "DELETE " } else { "SELECT " });
        sql.push_str(&projection(resource));
        sql.push_str(" FROM ");
        sql.push_str(&resource.table);
        sql.push_str(" AS ");
        sql.push_str(MAIN_TABLE_ALIAS);

        for join in &resource.joins {
            sql.push_str(&format!(
                " {} JOIN {} AS {} ON {}",
                join.kind.as_sql(),
                join.table,
                join.alias,
                join.on
            ));
        }

        let fragments = where_fragments(resource, &mut binds)?;
        if !fragments.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&fragments.join(" AND "));
        }

        if let Some(group_by) = &resource.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        for (i, order) in resource.order.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            sql.push_str(&order.column);
            sql.push(' ');
            sql.push_str(order.direction.as_sql());
        }

        if let Some(limit) = &resource.limit {
            sql.push_str(&format!(" LIMIT {}, {}", limit.offset, limit.limit));
        }

        sql.push(';');
        debug!(sql = %sql, binds = binds.len(), "built statement");
        Ok(Statement { sql, binds })
    }
}

fn projection(resource: &Resource) -> String {
    let columns = resource.select.join(", ");
    match &resource.distinct {
        Some(distinct) if !resource.select.iter().any(|c| c == distinct) => {
            format!("DISTINCT {distinct}, {columns}")
        }
        _ => columns,
    }
}

fn where_fragments(resource: &Resource, binds: &mut Bindings) -> Result<Vec<String>> {
    let mut formatter = ConditionFormatter::new(binds);
    let mut fragments = Vec::new();

    for filter in &resource.filters {
        for condition in &filter.conditions {
            fragments.push(formatter.format(&condition.operator, &filter.column, &condition.value)?);
        }
    }

    for group in &resource.or_filters {
        if let Some(fragment) = formatter.format_or_group(group)? {
            fragments.push(fragment);
        }
    }

    for expr in &resource.expressions {
        fragments.push(format!("{} {} {}", expr.column, expr.operator, expr.value));
    }

    Ok(fragments)
}
