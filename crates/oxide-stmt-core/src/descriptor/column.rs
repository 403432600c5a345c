//! Column descriptor.
//!
//! A [`Column`] describes one column to create, add or change. Toggle
//! options are tri-state so the alter path can tell "leave as is" from
//! "remove this attribute".

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::value::quote_literal;

/// MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SqlType {
    /// INT
    Int,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// MEDIUMINT
    MediumInt,
    /// BIGINT
    BigInt,
    /// FLOAT
    Float,
    /// DOUBLE
    Double,
    /// REAL
    Real,
    /// DECIMAL
    Decimal,
    /// NUMERIC
    Numeric,
    /// DATE
    Date,
    /// DATETIME
    DateTime,
    /// TIMESTAMP
    Timestamp,
    /// TIME
    Time,
    /// YEAR
    Year,
    /// CHAR
    Char,
    /// VARCHAR
    Varchar,
    /// BINARY
    Binary,
    /// BLOB
    Blob,
    /// TEXT
    Text,
    /// TINYBLOB
    TinyBlob,
    /// TINYTEXT
    TinyText,
    /// MEDIUMBLOB
    MediumBlob,
    /// MEDIUMTEXT
    MediumText,
    /// LONGBLOB
    LongBlob,
    /// LONGTEXT
    LongText,
    /// ENUM
    Enum,
}

impl SqlType {
    /// All supported types.
    pub const ALL: [Self; 27] = [
        Self::Int,
        Self::TinyInt,
        Self::SmallInt,
        Self::MediumInt,
        Self::BigInt,
        Self::Float,
        Self::Double,
        Self::Real,
        Self::Decimal,
        Self::Numeric,
        Self::Date,
        Self::DateTime,
        Self::Timestamp,
        Self::Time,
        Self::Year,
        Self::Char,
        Self::Varchar,
        Self::Binary,
        Self::Blob,
        Self::Text,
        Self::TinyBlob,
        Self::TinyText,
        Self::MediumBlob,
        Self::MediumText,
        Self::LongBlob,
        Self::LongText,
        Self::Enum,
    ];

    /// Returns the SQL keyword for this type.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::MediumInt => "MEDIUMINT",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Real => "REAL",
            Self::Decimal => "DECIMAL",
            Self::Numeric => "NUMERIC",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Time => "TIME",
            Self::Year => "YEAR",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::Binary => "BINARY",
            Self::Blob => "BLOB",
            Self::Text => "TEXT",
            Self::TinyBlob => "TINYBLOB",
            Self::TinyText => "TINYTEXT",
            Self::MediumBlob => "MEDIUMBLOB",
            Self::MediumText => "MEDIUMTEXT",
            Self::LongBlob => "LONGBLOB",
            Self::LongText => "LONGTEXT",
            Self::Enum => "ENUM",
        }
    }

    /// Whether a length suffix is emitted (and required) for this type.
    ///
    /// The BLOB/TEXT family, the date/time family and BINARY never take one.
    #[must_use]
    pub const fn takes_length(self) -> bool {
        !matches!(
            self,
            Self::Binary
                | Self::Blob
                | Self::TinyBlob
                | Self::MediumBlob
                | Self::LongBlob
                | Self::Text
                | Self::TinyText
                | Self::MediumText
                | Self::LongText
                | Self::Time
                | Self::Timestamp
                | Self::Date
                | Self::DateTime
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SqlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_sql() == upper)
            .ok_or_else(|| format!("unknown SQL type '{s}'"))
    }
}

impl TryFrom<String> for SqlType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SqlType> for String {
    fn from(ty: SqlType) -> Self {
        Self::from(ty.as_sql())
    }
}

/// The parenthesized part of a column type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    /// A single size, as in `VARCHAR(255)`.
    Size(u32),
    /// Precision and scale, as in `DECIMAL(10,2)`.
    Precision(u32, u32),
    /// The value list of an `ENUM`.
    Values(Vec<String>),
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(n) => write!(f, "{n}"),
            Self::Precision(p, s) => write!(f, "{p},{s}"),
            Self::Values(values) => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| quote_literal(v, '\''))
                    .collect();
                f.write_str(&quoted.join(","))
            }
        }
    }
}

/// A tri-state toggle option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Flag {
    /// Not specified; no clause is emitted.
    #[default]
    Unset,
    /// Explicitly set.
    On,
    /// Explicitly removed.
    Off,
}

impl Flag {
    /// Returns true for [`Flag::On`].
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Returns true for [`Flag::Unset`].
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl From<Option<bool>> for Flag {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::On,
            Some(false) => Self::Off,
        }
    }
}

impl From<Flag> for Option<bool> {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::Unset => None,
            Flag::On => Some(true),
            Flag::Off => Some(false),
        }
    }
}

/// A tri-state valued option: unset, set to a value, or explicitly cleared.
///
/// In JSON, a missing key or `null` is unset, `false` clears, and any
/// other value sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Setting<T> {
    /// Not specified.
    #[default]
    Unset,
    /// Set to a value.
    Set(T),
    /// Explicitly removed.
    Clear,
}

impl<T> Setting<T> {
    /// Returns true for [`Setting::Unset`].
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns the value if set.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Setting<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Set(v) => v.serialize(serializer),
            Self::Clear => serializer.serialize_bool(false),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Setting<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Toggle(bool),
            Value(T),
        }

        match Option::<Repr<T>>::deserialize(deserializer)? {
            None => Ok(Self::Unset),
            Some(Repr::Toggle(false)) => Ok(Self::Clear),
            Some(Repr::Toggle(true)) => Err(de::Error::custom(
                "`true` is not a value; give the value or `false` to clear",
            )),
            Some(Repr::Value(v)) => Ok(Self::Set(v)),
        }
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DefaultRepr", into = "DefaultRepr")]
pub enum DefaultValue {
    /// A literal, emitted double-quoted.
    Literal(String),
    /// A raw SQL expression, emitted as is.
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    ///
    /// A literal spelling `current_timestamp()` is emitted unquoted.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Literal(v) if is_current_timestamp(v) => v.clone(),
            Self::Literal(v) => quote_literal(v, '"'),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

fn is_current_timestamp(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower == "current_timestamp()" || lower == "current_timestamp"
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DefaultRepr {
    Text(String),
    Int(i64),
    Float(f64),
    Expression { expression: String },
}

impl From<DefaultRepr> for DefaultValue {
    fn from(repr: DefaultRepr) -> Self {
        match repr {
            DefaultRepr::Text(s) => Self::Literal(s),
            DefaultRepr::Int(n) => Self::Literal(n.to_string()),
            DefaultRepr::Float(f) => Self::Literal(f.to_string()),
            DefaultRepr::Expression { expression } => Self::Expression(expression),
        }
    }
}

impl From<DefaultValue> for DefaultRepr {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Literal(s) => Self::Text(s),
            DefaultValue::Expression(expression) => Self::Expression { expression },
        }
    }
}

/// A column to create, add, or change.
///
/// Built fluently:
///
/// ```
/// use oxide_stmt_core::{Column, SqlType};
///
/// let col = Column::new("email", SqlType::Varchar)
///     .length(255)
///     .not_null()
///     .comment("login address");
/// assert_eq!(col.name, "email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type. Optional for alterations that keep the current type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<SqlType>,
    /// Length, precision or ENUM values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Length>,
    /// UNSIGNED attribute.
    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub unsigned: Flag,
    /// NOT NULL (on) or NULL (off).
    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub not_null: Flag,
    /// AUTO_INCREMENT attribute.
    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub auto_increment: Flag,
    /// ZEROFILL attribute.
    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub zerofill: Flag,
    /// Makes this column the table's primary key.
    #[serde(default, skip_serializing_if = "Flag::is_unset")]
    pub primary_key: Flag,
    /// DEFAULT clause.
    #[serde(default, skip_serializing_if = "Setting::is_unset")]
    pub default: Setting<DefaultValue>,
    /// ON UPDATE expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    /// COMMENT clause.
    #[serde(default, skip_serializing_if = "Setting::is_unset")]
    pub comment: Setting<String>,
    /// New name when altering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_to: Option<String>,
}

impl Column {
    /// Creates a column with a type.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            sql_type: Some(sql_type),
            ..Self::alter(name)
        }
    }

    /// Creates a change request for an existing column, keeping its type
    /// unless [`Column::change_type`] is called.
    #[must_use]
    pub fn alter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            length: None,
            unsigned: Flag::Unset,
            not_null: Flag::Unset,
            auto_increment: Flag::Unset,
            zerofill: Flag::Unset,
            primary_key: Flag::Unset,
            default: Setting::Unset,
            on_update: None,
            comment: Setting::Unset,
            rename_to: None,
        }
    }

    /// Sets the type.
    #[must_use]
    pub const fn change_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    /// Sets a size, as in `VARCHAR(255)`.
    #[must_use]
    pub fn length(mut self, size: u32) -> Self {
        self.length = Some(Length::Size(size));
        self
    }

    /// Sets precision and scale, as in `DECIMAL(10,2)`.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.length = Some(Length::Precision(precision, scale));
        self
    }

    /// Sets the ENUM value list.
    #[must_use]
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.length = Some(Length::Values(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Marks the column UNSIGNED.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = Flag::On;
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = Flag::On;
        self
    }

    /// Marks the column explicitly nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.not_null = Flag::Off;
        self
    }

    /// Marks the column AUTO_INCREMENT.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = Flag::On;
        self
    }

    /// Marks the column ZEROFILL.
    #[must_use]
    pub const fn zerofill(mut self) -> Self {
        self.zerofill = Flag::On;
        self
    }

    /// Removes ZEROFILL when altering.
    #[must_use]
    pub const fn drop_zerofill(mut self) -> Self {
        self.zerofill = Flag::Off;
        self
    }

    /// Makes this column the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = Flag::On;
        self
    }

    /// Sets a literal default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Setting::Set(DefaultValue::Literal(value.into()));
        self
    }

    /// Sets an expression default, emitted unquoted.
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Setting::Set(DefaultValue::Expression(expr.into()));
        self
    }

    /// Removes the default when altering.
    #[must_use]
    pub fn drop_default(mut self) -> Self {
        self.default = Setting::Clear;
        self
    }

    /// Sets the ON UPDATE expression.
    #[must_use]
    pub fn on_update(mut self, expr: impl Into<String>) -> Self {
        self.on_update = Some(expr.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Setting::Set(comment.into());
        self
    }

    /// Clears the comment when altering.
    #[must_use]
    pub fn clear_comment(mut self) -> Self {
        self.comment = Setting::Clear;
        self
    }

    /// Renames the column when altering.
    #[must_use]
    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_parse_case_insensitive() {
        assert_eq!("varchar".parse::<SqlType>(), Ok(SqlType::Varchar));
        assert_eq!(" MediumText ".parse::<SqlType>(), Ok(SqlType::MediumText));
        assert!("VARCHAR2".parse::<SqlType>().is_err());
    }

    #[test]
    fn test_length_policy() {
        assert!(SqlType::Varchar.takes_length());
        assert!(SqlType::Decimal.takes_length());
        assert!(SqlType::Int.takes_length());
        assert!(SqlType::Enum.takes_length());
        for ty in [
            SqlType::Text,
            SqlType::LongBlob,
            SqlType::Binary,
            SqlType::Date,
            SqlType::DateTime,
            SqlType::Timestamp,
            SqlType::Time,
        ] {
            assert!(!ty.takes_length(), "{ty} must not take a length");
        }
    }

    #[test]
    fn test_length_display() {
        assert_eq!(Length::Size(255).to_string(), "255");
        assert_eq!(Length::Precision(10, 2).to_string(), "10,2");
        assert_eq!(
            Length::Values(vec![String::from("a"), String::from("it's")]).to_string(),
            "'a','it''s'"
        );
        assert_eq!(
            Length::Values(vec![String::from(r"back\"), String::from("b")]).to_string(),
            r"'back\\','b'"
        );
    }

    #[test]
    fn test_default_value_quoting() {
        assert_eq!(DefaultValue::Literal(String::from("0")).to_sql(), "\"0\"");
        assert_eq!(
            DefaultValue::Literal(String::from("say \"hi\"")).to_sql(),
            "\"say \"\"hi\"\"\""
        );
        assert_eq!(
            DefaultValue::Literal(String::from("current_timestamp()")).to_sql(),
            "current_timestamp()"
        );
        assert_eq!(
            DefaultValue::Literal(String::from(r"C:\")).to_sql(),
            r#""C:\\""#
        );
        assert_eq!(
            DefaultValue::Expression(String::from("(UUID())")).to_sql(),
            "(UUID())"
        );
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("price", SqlType::Decimal)
            .precision(10, 2)
            .unsigned()
            .not_null()
            .default_value("0.00");

        assert_eq!(col.sql_type, Some(SqlType::Decimal));
        assert_eq!(col.length, Some(Length::Precision(10, 2)));
        assert!(col.unsigned.is_on());
        assert!(col.not_null.is_on());
        assert_eq!(
            col.default,
            Setting::Set(DefaultValue::Literal(String::from("0.00")))
        );
        assert!(col.comment.is_unset());
    }

    #[test]
    fn test_alter_tri_state() {
        let col = Column::alter("status")
            .nullable()
            .drop_default()
            .drop_zerofill()
            .clear_comment();

        assert_eq!(col.sql_type, None);
        assert_eq!(col.not_null, Flag::Off);
        assert_eq!(col.zerofill, Flag::Off);
        assert_eq!(col.default, Setting::Clear);
        assert_eq!(col.comment, Setting::Clear);
        assert_eq!(col.unsigned, Flag::Unset);
    }

    #[test]
    fn test_column_from_json() {
        let col: Column = serde_json::from_str(
            r#"{
                "name": "status",
                "type": "enum",
                "length": ["active", "banned"],
                "not_null": true,
                "zerofill": false,
                "default": "active",
                "comment": false
            }"#,
        )
        .unwrap();

        assert_eq!(col.sql_type, Some(SqlType::Enum));
        assert_eq!(
            col.length,
            Some(Length::Values(vec![
                String::from("active"),
                String::from("banned")
            ]))
        );
        assert_eq!(col.not_null, Flag::On);
        assert_eq!(col.zerofill, Flag::Off);
        assert_eq!(col.auto_increment, Flag::Unset);
        assert_eq!(
            col.default,
            Setting::Set(DefaultValue::Literal(String::from("active")))
        );
        assert_eq!(col.comment, Setting::Clear);
    }

    #[test]
    fn test_column_json_defaults_and_expressions() {
        let col: Column = serde_json::from_str(
            r#"{"name": "n", "type": "DECIMAL", "length": [10, 2], "default": 0}"#,
        )
        .unwrap();
        assert_eq!(col.length, Some(Length::Precision(10, 2)));
        assert_eq!(
            col.default,
            Setting::Set(DefaultValue::Literal(String::from("0")))
        );

        let col: Column = serde_json::from_str(
            r#"{"name": "ts", "type": "TIMESTAMP", "default": {"expression": "NOW()"}}"#,
        )
        .unwrap();
        assert_eq!(
            col.default,
            Setting::Set(DefaultValue::Expression(String::from("NOW()")))
        );

        let err = serde_json::from_str::<Column>(r#"{"name": "c", "comment": true}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_column_serializes_only_set_options() {
        let col = Column::new("id", SqlType::Int).length(11).unsigned();
        let json = serde_json::to_string(&col).unwrap();
        assert_eq!(
            json,
            r#"{"name":"id","type":"INT","length":11,"unsigned":true}"#
        );
    }
}
