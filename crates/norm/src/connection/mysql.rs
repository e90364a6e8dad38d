//! MySQL backend: connection strings and row decoding.

use std::sync::Arc;

use chrono::NaiveDateTime;
use norm_core::SqlValue;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::{Column as _, ConnectOptions, Row as _, TypeInfo, ValueRef};

use super::rows::Row;
use crate::config::parse_pairs;
use crate::error::{OrmError, Result};

/// Parses a `server=…;user=…;password=…;database=…;port=…;` string into
/// connect options. Later keys override earlier ones.
pub(crate) fn connect_options(connection_string: &str) -> Result<MySqlConnectOptions> {
    let mut options = MySqlConnectOptions::new();
    for (key, value) in parse_pairs(connection_string) {
        options = match key.to_ascii_lowercase().as_str() {
            "server" | "host" => options.host(&value),
            "user" | "username" => options.username(&value),
            "password" => options.password(&value),
            "database" => options.database(&value),
            "port" => options.port(value.parse().map_err(|_| {
                OrmError::InvalidConfiguration(format!("invalid port '{value}'"))
            })?),
            other => {
                return Err(OrmError::InvalidConfiguration(format!(
                    "unknown mysql option '{other}'"
                )))
            }
        };
    }
    Ok(options.disable_statement_logging())
}

pub(crate) fn decode_rows(rows: &[MySqlRow]) -> std::result::Result<Vec<Row>, sqlx::Error> {
    rows.iter().map(decode_row).collect()
}

fn decode_row(row: &MySqlRow) -> std::result::Result<Row, sqlx::Error> {
    let columns: Arc<[String]> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let values = (0..columns.len())
        .map(|index| decode_value(row, index))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Row::new(columns, values))
}

/// Decodes by the column type the server reports. `DATETIME` and `TIMESTAMP`
/// carry no zone and are read as UTC.
fn decode_value(row: &MySqlRow, index: usize) -> std::result::Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = row.column(index).type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked::<bool, _>(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => {
            let n = row.try_get_unchecked::<u64, _>(index)?;
            i64::try_from(n).map_or_else(|_| SqlValue::Text(n.to_string()), SqlValue::Int)
        }
        "FLOAT" => SqlValue::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        "DATETIME" | "TIMESTAMP" => {
            SqlValue::Timestamp(row.try_get_unchecked::<NaiveDateTime, _>(index)?.and_utc())
        }
        _ => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => SqlValue::Text(text),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };
    Ok(value)
}
