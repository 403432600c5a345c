//! Query descriptor.
//!
//! A [`Resource`] describes a SELECT or DELETE: target table, projection,
//! joins, filters, grouping, ordering and limit. Its JSON form keeps the
//! declaration order of column-keyed maps, since that order decides the
//! order of WHERE fragments and bind values.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::value::{SqlValue, ToSqlValue};

/// The value a condition is applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// An inclusive range, used by `date` (BETWEEN).
    Range {
        /// Lower bound.
        from: SqlValue,
        /// Upper bound.
        to: SqlValue,
    },
    /// A list of values, used by `in`/`nin`, or OR-expanded by binary operators.
    List(Vec<SqlValue>),
    /// A single value.
    Scalar(SqlValue),
}

impl Default for FilterValue {
    fn default() -> Self {
        Self::Scalar(SqlValue::Null)
    }
}

/// One `{operator: value}` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Operator keyword (`eq`, `in`, `date`, ...).
    pub operator: String,
    /// Operand.
    pub value: FilterValue,
}

impl Condition {
    /// Creates a condition from a keyword and operand.
    #[must_use]
    pub fn new(operator: impl Into<String>, value: FilterValue) -> Self {
        Self {
            operator: operator.into(),
            value,
        }
    }

    fn scalar(operator: &str, value: impl ToSqlValue) -> Self {
        Self::new(operator, FilterValue::Scalar(value.to_sql_value()))
    }

    fn list<I, T>(operator: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::new(
            operator,
            FilterValue::List(values.into_iter().map(ToSqlValue::to_sql_value).collect()),
        )
    }

    /// `column = value`
    #[must_use]
    pub fn eq(value: impl ToSqlValue) -> Self {
        Self::scalar("eq", value)
    }

    /// `column != value`
    #[must_use]
    pub fn neq(value: impl ToSqlValue) -> Self {
        Self::scalar("neq", value)
    }

    /// `column > value`
    #[must_use]
    pub fn gt(value: impl ToSqlValue) -> Self {
        Self::scalar("gt", value)
    }

    /// `column < value`
    #[must_use]
    pub fn lt(value: impl ToSqlValue) -> Self {
        Self::scalar("lt", value)
    }

    /// `column >= value`
    #[must_use]
    pub fn gteq(value: impl ToSqlValue) -> Self {
        Self::scalar("gteq", value)
    }

    /// `column <= value`
    #[must_use]
    pub fn lteq(value: impl ToSqlValue) -> Self {
        Self::scalar("lteq", value)
    }

    /// `column LIKE pattern`
    #[must_use]
    pub fn like(pattern: impl ToSqlValue) -> Self {
        Self::scalar("like", pattern)
    }

    /// `column NOT LIKE pattern`
    #[must_use]
    pub fn nlike(pattern: impl ToSqlValue) -> Self {
        Self::scalar("nlike", pattern)
    }

    /// `column IN (...)`
    #[must_use]
    pub fn in_list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::list("in", values)
    }

    /// `column NOT IN (...)`
    #[must_use]
    pub fn not_in<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::list("nin", values)
    }

    /// Binary operator applied to each value, OR-combined.
    #[must_use]
    pub fn any_of<I, T>(operator: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToSqlValue,
    {
        Self::list(operator, values)
    }

    /// `column IS NULL`
    #[must_use]
    pub fn null() -> Self {
        Self::new("null", FilterValue::default())
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn not_null() -> Self {
        Self::new("not-null", FilterValue::default())
    }

    /// `column BETWEEN from AND to`
    #[must_use]
    pub fn date(from: impl ToSqlValue, to: impl ToSqlValue) -> Self {
        Self::new(
            "date",
            FilterValue::Range {
                from: from.to_sql_value(),
                to: to.to_sql_value(),
            },
        )
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.operator, &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (operator, value) = deserializer.deserialize_map(SingleEntry::new("a condition"))?;
        Ok(Self { operator, value })
    }
}

/// The conditions on one column, AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    /// Filtered column.
    pub column: String,
    /// Conditions in declaration order.
    pub conditions: Vec<Condition>,
}

/// One member of an OR-group.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Filtered column.
    pub column: String,
    /// The condition.
    pub condition: Condition,
}

impl Predicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }
}

/// A raw, unparameterized `column operator value` fragment.
///
/// The value is pasted into the SQL as is; callers own its safety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    /// Left-hand side.
    pub column: String,
    /// Raw operator.
    pub operator: String,
    /// Raw right-hand side.
    pub value: String,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    /// INNER JOIN
    Inner,
    /// LEFT JOIN
    Left,
    /// RIGHT JOIN
    Right,
    /// CROSS JOIN
    Cross,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Cross => "CROSS",
        }
    }
}

/// A joined table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    /// Join type.
    #[serde(rename = "type")]
    pub kind: JoinKind,
    /// Joined table.
    pub table: String,
    /// Alias of the joined table.
    pub alias: String,
    /// ON clause, raw.
    pub on: String,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Ascending.
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    /// Descending.
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Sorted column or expression.
    pub column: String,
    /// Direction.
    pub direction: Direction,
}

impl Serialize for OrderBy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.column, &self.direction)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (column, direction) =
            deserializer.deserialize_map(SingleEntry::new("an order entry"))?;
        Ok(Self { column, direction })
    }
}

/// `LIMIT offset, limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    /// Rows to skip.
    #[serde(default)]
    pub offset: u64,
    /// Rows to return.
    pub limit: u64,
}

/// A SELECT or DELETE description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Target table, aliased `main_table`.
    pub table: String,
    /// Projected columns.
    #[serde(default)]
    pub select: Vec<String>,
    /// Column to select DISTINCT, prepended unless already selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<String>,
    /// Joins in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,
    /// Per-column filters.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "ser_filters",
        deserialize_with = "de_filters"
    )]
    pub filters: Vec<ColumnFilter>,
    /// OR-groups, AND-combined with everything else.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "ser_or_filters",
        deserialize_with = "de_or_filters"
    )]
    pub or_filters: Vec<Vec<Predicate>>,
    /// Raw expressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<Expression>,
    /// GROUP BY expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// ORDER BY entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<OrderBy>,
    /// LIMIT clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
}

impl Resource {
    /// Creates a descriptor for a table with nothing selected.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Appends projected columns.
    #[must_use]
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Selects DISTINCT on a column.
    #[must_use]
    pub fn distinct(mut self, column: impl Into<String>) -> Self {
        self.distinct = Some(column.into());
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            alias: alias.into(),
            on: on.into(),
        });
        self
    }

    /// Adds a condition on a column, AND-combined with its other conditions.
    #[must_use]
    pub fn filter(mut self, column: impl Into<String>, condition: Condition) -> Self {
        let column = column.into();
        match self.filters.iter_mut().find(|f| f.column == column) {
            Some(existing) => existing.conditions.push(condition),
            None => self.filters.push(ColumnFilter {
                column,
                conditions: vec![condition],
            }),
        }
        self
    }

    /// Adds an OR-group.
    #[must_use]
    pub fn or_filter(mut self, group: Vec<Predicate>) -> Self {
        self.or_filters.push(group);
        self
    }

    /// Adds a raw expression.
    #[must_use]
    pub fn expression(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.expressions.push(Expression {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    /// Sets GROUP BY.
    #[must_use]
    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    /// Appends an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Sets `LIMIT offset, limit`.
    #[must_use]
    pub const fn limit(mut self, offset: u64, limit: u64) -> Self {
        self.limit = Some(Limit { offset, limit });
        self
    }
}

/// Reads a map with exactly one entry.
struct SingleEntry<K, V> {
    expecting: &'static str,
    marker: PhantomData<(K, V)>,
}

impl<K, V> SingleEntry<K, V> {
    const fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            marker: PhantomData,
        }
    }
}

impl<'de, K: Deserialize<'de>, V: Deserialize<'de>> Visitor<'de> for SingleEntry<K, V> {
    type Value = (K, V);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as a single-entry map", self.expecting)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let entry = map
            .next_entry()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        if map.next_key::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(2, &self));
        }
        Ok(entry)
    }
}

/// Reads a map into its entries, in document order.
struct OrderedEntries<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedEntries<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map keyed by column name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// A column-keyed map whose values are one condition or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Condition),
    Many(Vec<Condition>),
}

fn de_filters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ColumnFilter>, D::Error> {
    let entries = deserializer.deserialize_map(OrderedEntries::<OneOrMany>(PhantomData))?;
    Ok(entries
        .into_iter()
        .map(|(column, conditions)| ColumnFilter {
            column,
            conditions: match conditions {
                OneOrMany::One(c) => vec![c],
                OneOrMany::Many(cs) => cs,
            },
        })
        .collect())
}

fn ser_filters<S: Serializer>(filters: &[ColumnFilter], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(filters.len()))?;
    for filter in filters {
        map.serialize_entry(&filter.column, &filter.conditions)?;
    }
    map.end()
}

/// One OR-group in JSON form.
struct OrGroup(Vec<Predicate>);

impl<'de> Deserialize<'de> for OrGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserializer.deserialize_map(OrderedEntries::<Condition>(PhantomData))?;
        Ok(Self(
            entries
                .into_iter()
                .map(|(column, condition)| Predicate { column, condition })
                .collect(),
        ))
    }
}

fn de_or_filters<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Vec<Predicate>>, D::Error> {
    let groups = Vec::<OrGroup>::deserialize(deserializer)?;
    Ok(groups.into_iter().map(|g| g.0).collect())
}

fn ser_or_filters<S: Serializer>(
    groups: &[Vec<Predicate>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    struct Group<'a>(&'a [Predicate]);

    impl Serialize for Group<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for p in self.0 {
                map.serialize_entry(&p.column, &p.condition)?;
            }
            map.end()
        }
    }

    serializer.collect_seq(groups.iter().map(|g| Group(g)))
}
