//! Condition formatting.
//!
//! Maps operator keywords to parenthesized SQL fragments with `?`
//! placeholders, appending the bound values in emission order.

use std::str::FromStr;

use crate::descriptor::{FilterValue, Predicate};
use crate::error::{Error, Result};
use crate::value::SqlValue;

/// Filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `eq`: =
    Eq,
    /// `neq`: !=
    Neq,
    /// `gt`: >
    Gt,
    /// `lt`: <
    Lt,
    /// `gteq`: >=
    Gteq,
    /// `lteq`: <=
    Lteq,
    /// `like`: LIKE
    Like,
    /// `nlike`: NOT LIKE
    NotLike,
    /// `in`: IN
    In,
    /// `nin`: NOT IN
    NotIn,
    /// `null`: IS NULL
    IsNull,
    /// `not-null`: IS NOT NULL
    IsNotNull,
    /// `date`: BETWEEN
    Between,
}

impl Operator {
    /// Returns the SQL operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gteq => ">=",
            Self::Lteq => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Between => "BETWEEN",
        }
    }

    /// Returns the descriptor keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gteq => "gteq",
            Self::Lteq => "lteq",
            Self::Like => "like",
            Self::NotLike => "nlike",
            Self::In => "in",
            Self::NotIn => "nin",
            Self::IsNull => "null",
            Self::IsNotNull => "not-null",
            Self::Between => "date",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "gteq" => Ok(Self::Gteq),
            "lteq" => Ok(Self::Lteq),
            "like" => Ok(Self::Like),
            "nlike" => Ok(Self::NotLike),
            "in" => Ok(Self::In),
            "nin" => Ok(Self::NotIn),
            "null" => Ok(Self::IsNull),
            "not-null" => Ok(Self::IsNotNull),
            "date" => Ok(Self::Between),
            other => Err(Error::UnsupportedCondition(String::from(other))),
        }
    }
}

/// Positional bind values. Positions start at 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: Vec<SqlValue>,
}

impl Bindings {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Appends a value and returns its position.
    pub fn push(&mut self, value: SqlValue) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// The position the next pushed value will get.
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.values.len() + 1
    }

    /// Iterates over `(position, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SqlValue)> {
        self.values.iter().enumerate().map(|(i, v)| (i + 1, v))
    }

    /// The values in position order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes all values; the next position is 1 again.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl From<Vec<SqlValue>> for Bindings {
    fn from(values: Vec<SqlValue>) -> Self {
        Self { values }
    }
}

/// Formats conditions into WHERE fragments, binding into a shared list.
#[derive(Debug)]
pub struct ConditionFormatter<'b> {
    binds: &'b mut Bindings,
}

impl<'b> ConditionFormatter<'b> {
    /// Creates a formatter appending to `binds`.
    pub fn new(binds: &'b mut Bindings) -> Self {
        Self { binds }
    }

    /// Formats one condition.
    ///
    /// Fails with [`Error::UnsupportedCondition`] for an unknown keyword and
    /// [`Error::InvalidConditionValue`] when the value does not fit the
    /// operator. Nothing is bound on failure.
    pub fn format(&mut self, operator: &str, column: &str, value: &FilterValue) -> Result<String> {
        let op: Operator = operator.parse()?;
        let invalid = || Error::InvalidConditionValue {
            operator: String::from(operator),
            column: String::from(column),
        };

        match op {
            Operator::IsNull | Operator::IsNotNull => Ok(format!("({column} {})", op.as_sql())),
            Operator::Between => match value {
                FilterValue::Range { from, to } => {
                    self.binds.push(from.clone());
                    self.binds.push(to.clone());
                    Ok(format!("({column} BETWEEN ? AND ?)"))
                }
                _ => Err(invalid()),
            },
            Operator::In | Operator::NotIn => {
                let placeholders = match value {
                    FilterValue::List(values) if values.is_empty() => return Err(invalid()),
                    FilterValue::List(values) => {
                        for v in values {
                            self.binds.push(v.clone());
                        }
                        vec!["?"; values.len()].join(",")
                    }
                    FilterValue::Scalar(v) => {
                        self.binds.push(v.clone());
                        String::from("?")
                    }
                    FilterValue::Range { .. } => return Err(invalid()),
                };
                Ok(format!("({column} {} ({placeholders}))", op.as_sql()))
            }
            _ => match value {
                FilterValue::Scalar(v) => {
                    self.binds.push(v.clone());
                    Ok(format!("({column} {} ?)", op.as_sql()))
                }
                FilterValue::List(values) if !values.is_empty() => {
                    let parts: Vec<String> = values
                        .iter()
                        .map(|v| {
                            self.binds.push(v.clone());
                            format!("{column} {} ?", op.as_sql())
                        })
                        .collect();
                    Ok(format!("({})", parts.join(" OR ")))
                }
                _ => Err(invalid()),
            },
        }
    }

    /// Formats an OR-group as one parenthesized fragment.
    ///
    /// Returns `None` for an empty group. Every member is validated before
    /// anything is bound.
    pub fn format_or_group(&mut self, group: &[Predicate]) -> Result<Option<String>> {
        if group.is_empty() {
            return Ok(None);
        }

        let mut scratch = Bindings::new();
        let mut parts = Vec::with_capacity(group.len());
        {
            let mut inner = ConditionFormatter::new(&mut scratch);
            for predicate in group {
                parts.push(inner.format(
                    &predicate.condition.operator,
                    &predicate.column,
                    &predicate.condition.value,
                )?);
            }
        }
        for value in scratch.values {
            self.binds.push(value);
        }
        Ok(Some(format!("({})", parts.join(" OR "))))
    }
}
