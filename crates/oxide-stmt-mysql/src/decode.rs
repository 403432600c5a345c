//! Result row decoding.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use oxide_stmt_core::{Row, SqlValue, ToSqlValue};
use sqlx::mysql::MySqlRow;
use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};

use crate::error::{MySqlError, Result};

/// How a server type is mapped to a [`SqlValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integer types and YEAR.
    Signed,
    /// Unsigned integer types.
    Unsigned,
    /// FLOAT.
    Float,
    /// DOUBLE.
    Double,
    /// TINYINT(1).
    Boolean,
    /// DATE.
    Date,
    /// DATETIME and TIMESTAMP.
    DateTime,
    /// TIME.
    Time,
    /// Binary strings and BIT.
    Bytes,
    /// Character strings, DECIMAL, JSON and anything unrecognized.
    Text,
}

/// Classifies a driver type name such as `INT UNSIGNED` or `VARCHAR`.
#[must_use]
pub fn classify(type_name: &str) -> ValueKind {
    let upper = type_name.to_ascii_uppercase();
    let base = upper.split_whitespace().next().unwrap_or_default();
    let unsigned = upper.contains("UNSIGNED");

    match base {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" if unsigned => {
            ValueKind::Unsigned
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            ValueKind::Signed
        }
        "BOOLEAN" | "BOOL" => ValueKind::Boolean,
        "FLOAT" => ValueKind::Float,
        "DOUBLE" | "REAL" => ValueKind::Double,
        "DATE" => ValueKind::Date,
        "DATETIME" | "TIMESTAMP" => ValueKind::DateTime,
        "TIME" => ValueKind::Time,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => ValueKind::Bytes,
        _ => ValueKind::Text,
    }
}

/// Converts a driver row into a [`Row`], keeping column order.
pub fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = decode_value(row, index, classify(type_name)).map_err(|source| {
            MySqlError::Decode {
                column: String::from(column.name()),
                type_name: String::from(type_name),
                source,
            }
        })?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn decode_value(row: &MySqlRow, index: usize, kind: ValueKind) -> sqlx::Result<SqlValue> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let value = match kind {
        ValueKind::Signed => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
        ValueKind::Unsigned => {
            let n = row.try_get_unchecked::<u64, _>(index)?;
            i64::try_from(n).map_or_else(|_| SqlValue::Text(n.to_string()), SqlValue::Int)
        }
        ValueKind::Boolean => SqlValue::Bool(row.try_get::<bool, _>(index)?),
        ValueKind::Float => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        ValueKind::Double => SqlValue::Float(row.try_get::<f64, _>(index)?),
        ValueKind::Date => row.try_get::<NaiveDate, _>(index)?.to_sql_value(),
        ValueKind::DateTime => row.try_get::<NaiveDateTime, _>(index)?.to_sql_value(),
        ValueKind::Time => row.try_get::<NaiveTime, _>(index)?.to_sql_value(),
        ValueKind::Bytes => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        ValueKind::Text => match row.try_get_unchecked::<String, _>(index) {
            Ok(s) => SqlValue::Text(s),
            Err(_) => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        },
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_integers() {
        assert_eq!(classify("INT"), ValueKind::Signed);
        assert_eq!(classify("BIGINT"), ValueKind::Signed);
        assert_eq!(classify("YEAR"), ValueKind::Signed);
        assert_eq!(classify("INT UNSIGNED"), ValueKind::Unsigned);
        assert_eq!(classify("tinyint unsigned"), ValueKind::Unsigned);
        assert_eq!(classify("BOOLEAN"), ValueKind::Boolean);
    }

    #[test]
    fn test_classify_other_types() {
        assert_eq!(classify("FLOAT"), ValueKind::Float);
        assert_eq!(classify("DOUBLE"), ValueKind::Double);
        assert_eq!(classify("DATE"), ValueKind::Date);
        assert_eq!(classify("TIMESTAMP"), ValueKind::DateTime);
        assert_eq!(classify("TIME"), ValueKind::Time);
        assert_eq!(classify("VARBINARY"), ValueKind::Bytes);
        assert_eq!(classify("LONGBLOB"), ValueKind::Bytes);
        assert_eq!(classify("DECIMAL"), ValueKind::Text);
        assert_eq!(classify("VARCHAR"), ValueKind::Text);
        assert_eq!(classify("JSON"), ValueKind::Text);
        assert_eq!(classify(""), ValueKind::Text);
    }
}
