//! SQLite backend: connection strings and row decoding.

use std::str::FromStr;
use std::sync::Arc;

use norm_core::SqlValue;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column as _, ConnectOptions, Row as _, TypeInfo, ValueRef};

use super::rows::Row;
use crate::config::parse_pairs;
use crate::error::{OrmError, Result};

/// Parses a `Data Source=…;Mode=…;Cache=…` string into connect options.
pub(crate) fn connect_options(connection_string: &str) -> Result<SqliteConnectOptions> {
    let mut data_source = None;
    let mut mode = None;
    let mut cache = None;
    for (key, value) in parse_pairs(connection_string) {
        match key.to_ascii_lowercase().as_str() {
            "data source" => data_source = Some(value),
            "mode" => mode = Some(value.to_ascii_lowercase()),
            "cache" => cache = Some(value.to_ascii_lowercase()),
            other => {
                return Err(OrmError::InvalidConfiguration(format!(
                    "unknown sqlite option '{other}'"
                )))
            }
        }
    }
    let data_source = data_source
        .ok_or_else(|| OrmError::InvalidConfiguration(String::from("missing Data Source")))?;

    let options = if data_source == ":memory:" {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else if mode.as_deref() == Some("memory") {
        SqliteConnectOptions::from_str(&format!(
            "sqlite:file:{data_source}?mode=memory&cache=shared"
        ))?
    } else {
        let options = SqliteConnectOptions::new().filename(&data_source);
        match mode.as_deref() {
            None | Some("readwritecreate") => options.create_if_missing(true),
            Some("readwrite") => options,
            Some("readonly") => options.read_only(true),
            Some(other) => {
                return Err(OrmError::InvalidConfiguration(format!(
                    "unknown sqlite mode '{other}'"
                )))
            }
        }
    };

    let options = if cache.as_deref() == Some("shared") {
        options.shared_cache(true)
    } else {
        options
    };
    Ok(options.disable_statement_logging())
}

pub(crate) fn decode_rows(rows: &[SqliteRow]) -> std::result::Result<Vec<Row>, sqlx::Error> {
    rows.iter().map(decode_row).collect()
}

fn decode_row(row: &SqliteRow) -> std::result::Result<Row, sqlx::Error> {
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

/// Decodes by the storage class of the value, not the declared column type.
fn decode_value(row: &SqliteRow, index: usize) -> std::result::Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_ascii_uppercase();

    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}
