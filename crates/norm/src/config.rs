//! Connection configuration: the fluent builder and its file form.

use std::path::Path;
use std::sync::Arc;

use norm_core::{Dialect, Registry};
use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::{OrmError, Result};

/// Splits `key=value;key=value` into trimmed pairs. Empty segments are
/// skipped; a segment without `=` yields an empty value.
pub(crate) fn parse_pairs(connection_string: &str) -> Vec<(String, String)> {
    connection_string
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}

/// Fluent configurator for a [`Connection`].
///
/// Options belong to one dialect; setting an option of the other dialect
/// fails with [`OrmError::ProviderIncompatible`].
///
/// ```no_run
/// use norm::{ConnectionBuilder, Dialect};
///
/// # fn main() -> norm::Result<()> {
/// let connection = ConnectionBuilder::new(Dialect::Sqlite)
///     .data_source("blog.db")?
///     .build_and_connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    dialect: Dialect,
    registry: Option<Arc<Registry>>,
    data_source: Option<String>,
    options: Vec<(&'static str, String)>,
}

impl ConnectionBuilder {
    /// Starts a configuration for `dialect`.
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            registry: None,
            data_source: None,
            options: Vec::new(),
        }
    }

    /// Uses `registry` instead of the process-wide one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the SQLite data source: a file path, `:memory:`, or a shared
    /// memory source such as `name;Mode=Memory;Cache=Shared`. The last call
    /// wins.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a MySQL builder.
    pub fn data_source(mut self, data_source: impl Into<String>) -> Result<Self> {
        self.require(Dialect::Sqlite, "data source")?;
        self.data_source = Some(data_source.into());
        Ok(self)
    }

    /// Shorthand for a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a MySQL builder.
    pub fn in_memory(self) -> Result<Self> {
        self.data_source(":memory:")
    }

    /// Sets the MySQL server host.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a SQLite builder.
    pub fn hostname(self, host: impl Into<String>) -> Result<Self> {
        self.option("server", host.into())
    }

    /// Sets the MySQL user.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a SQLite builder.
    pub fn username(self, user: impl Into<String>) -> Result<Self> {
        self.option("user", user.into())
    }

    /// Sets the MySQL password.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a SQLite builder.
    pub fn password(self, password: impl Into<String>) -> Result<Self> {
        self.option("password", password.into())
    }

    /// Sets the MySQL database.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a SQLite builder.
    pub fn database(self, database: impl Into<String>) -> Result<Self> {
        self.option("database", database.into())
    }

    /// Sets the MySQL port.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] on a SQLite builder.
    pub fn port(self, port: u16) -> Result<Self> {
        self.option("port", port.to_string())
    }

    /// The dialect being configured.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Renders the connection string.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::InvalidConfiguration`] on a SQLite builder
    /// without a data source.
    pub fn connection_string(&self) -> Result<String> {
        match self.dialect {
            Dialect::Sqlite => {
                let data_source = self.data_source.as_deref().ok_or_else(|| {
                    OrmError::InvalidConfiguration(String::from("sqlite requires a data source"))
                })?;
                if data_source == ":memory:" || is_memory_mode(data_source) {
                    Ok(format!("Data Source={data_source}"))
                } else {
                    Ok(format!(
                        "Data Source={data_source};Mode=ReadWriteCreate;Cache=Shared"
                    ))
                }
            }
            Dialect::MySql => Ok(self
                .options
                .iter()
                .map(|(key, value)| format!("{key}={value};"))
                .collect()),
        }
    }

    /// Builds an unopened connection.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is incomplete or the runtime cannot start.
    pub fn build(self) -> Result<Connection> {
        let connection_string = self.connection_string()?;
        let registry = self.registry.unwrap_or_else(Registry::global);
        Connection::new(self.dialect, connection_string, registry)
    }

    /// Builds and opens a connection.
    ///
    /// # Errors
    ///
    /// Fails like [`build`](Self::build), or if the database refuses.
    pub fn build_and_connect(self) -> Result<Connection> {
        let connection = self.build()?;
        connection.open()?;
        Ok(connection)
    }

    fn option(mut self, key: &'static str, value: String) -> Result<Self> {
        self.require(Dialect::MySql, key)?;
        self.options.push((key, value));
        Ok(self)
    }

    fn require(&self, dialect: Dialect, option: &str) -> Result<()> {
        if self.dialect == dialect {
            Ok(())
        } else {
            Err(OrmError::ProviderIncompatible(format!(
                "option '{option}' is only valid for {dialect}, not {}",
                self.dialect
            )))
        }
    }
}

fn is_memory_mode(data_source: &str) -> bool {
    parse_pairs(data_source).iter().any(|(key, value)| {
        key.eq_ignore_ascii_case("mode") && value.eq_ignore_ascii_case("memory")
    })
}

const fn default_auto_open() -> bool {
    true
}

/// Connection settings as read from a JSON file.
///
/// ```json
/// { "dialect": "mysql", "host": "localhost", "user": "app", "database": "blog" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Database engine to connect to.
    pub dialect: Dialect,
    /// SQLite database file. Embedded dialect only.
    #[serde(default)]
    pub data_source: Option<String>,
    /// Use a private in-memory SQLite database.
    #[serde(default)]
    pub in_memory: bool,
    /// Server host name. Networked dialect only.
    #[serde(default)]
    pub host: Option<String>,
    /// Login user name.
    #[serde(default)]
    pub user: Option<String>,
    /// Login password.
    #[serde(default)]
    pub password: Option<String>,
    /// Database (schema) to select after connecting.
    #[serde(default)]
    pub database: Option<String>,
    /// Server port. The driver default applies when unset.
    #[serde(default)]
    pub port: Option<u16>,
    /// Open the connection when built. Defaults to `true`.
    #[serde(default = "default_auto_open")]
    pub auto_open: bool,
}

impl ConnectionConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Config`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Io`] or [`OrmError::Config`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Applies the settings, in field order, to a fresh builder.
    ///
    /// # Errors
    ///
    /// Fails with [`OrmError::ProviderIncompatible`] when a setting belongs
    /// to the other dialect.
    pub fn into_builder(self) -> Result<ConnectionBuilder> {
        let mut builder = ConnectionBuilder::new(self.dialect);
        if let Some(data_source) = self.data_source {
            builder = builder.data_source(data_source)?;
        }
        if self.in_memory {
            builder = builder.in_memory()?;
        }
        if let Some(host) = self.host {
            builder = builder.hostname(host)?;
        }
        if let Some(user) = self.user {
            builder = builder.username(user)?;
        }
        if let Some(password) = self.password {
            builder = builder.password(password)?;
        }
        if let Some(database) = self.database {
            builder = builder.database(database)?;
        }
        if let Some(port) = self.port {
            builder = builder.port(port)?;
        }
        Ok(builder)
    }

    /// Builds the connection, opening it when `auto_open` is set.
    ///
    /// # Errors
    ///
    /// Fails like [`into_builder`](Self::into_builder) and
    /// [`ConnectionBuilder::build_and_connect`].
    pub fn connect(self) -> Result<Connection> {
        let auto_open = self.auto_open;
        let builder = self.into_builder()?;
        if auto_open {
            builder.build_and_connect()
        } else {
            builder.build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        assert_eq!(
            parse_pairs(" Data Source = blog.db ;Mode=ReadWriteCreate;;flag"),
            vec![
                ("Data Source".to_string(), "blog.db".to_string()),
                ("Mode".to_string(), "ReadWriteCreate".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_sqlite_connection_strings() {
        let file = ConnectionBuilder::new(Dialect::Sqlite)
            .data_source("blog.db")
            .unwrap();
        assert_eq!(
            file.connection_string().unwrap(),
            "Data Source=blog.db;Mode=ReadWriteCreate;Cache=Shared"
        );

        let memory = ConnectionBuilder::new(Dialect::Sqlite).in_memory().unwrap();
        assert_eq!(memory.connection_string().unwrap(), "Data Source=:memory:");

        let shared = ConnectionBuilder::new(Dialect::Sqlite)
            .data_source("blog;Mode=Memory;Cache=Shared")
            .unwrap();
        assert_eq!(
            shared.connection_string().unwrap(),
            "Data Source=blog;Mode=Memory;Cache=Shared"
        );
    }

    #[test]
    fn test_last_data_source_wins() {
        let builder = ConnectionBuilder::new(Dialect::Sqlite)
            .data_source("first.db")
            .unwrap()
            .in_memory()
            .unwrap();
        assert_eq!(builder.connection_string().unwrap(), "Data Source=:memory:");
    }

    #[test]
    fn test_mysql_connection_string_keeps_call_order() {
        let builder = ConnectionBuilder::new(Dialect::MySql)
            .database("blog")
            .unwrap()
            .hostname("db.local")
            .unwrap()
            .port(3307)
            .unwrap();
        assert_eq!(
            builder.connection_string().unwrap(),
            "database=blog;server=db.local;port=3307;"
        );
    }

    #[test]
    fn test_wrong_dialect_options() {
        assert!(matches!(
            ConnectionBuilder::new(Dialect::Sqlite).hostname("db.local"),
            Err(OrmError::ProviderIncompatible(_))
        ));
        assert!(matches!(
            ConnectionBuilder::new(Dialect::MySql).in_memory(),
            Err(OrmError::ProviderIncompatible(_))
        ));
    }

    #[test]
    fn test_sqlite_without_source_is_invalid() {
        assert!(matches!(
            ConnectionBuilder::new(Dialect::Sqlite).build(),
            Err(OrmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = ConnectionConfig::from_json(
            r#"{ "dialect": "mysql", "host": "db.local", "user": "app", "port": 3306 }"#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::MySql);
        assert!(config.auto_open);
        let builder = config.into_builder().unwrap();
        assert_eq!(
            builder.connection_string().unwrap(),
            "server=db.local;user=app;port=3306;"
        );
    }

    #[test]
    fn test_config_rejects_mixed_dialects() {
        let config = ConnectionConfig::from_json(
            r#"{ "dialect": "sqlite", "in_memory": true, "host": "x" }"#,
        )
        .unwrap();
        assert!(matches!(
            config.into_builder(),
            Err(OrmError::ProviderIncompatible(_))
        ));
    }

    #[test]
    fn test_config_rejects_unknown_keys() {
        assert!(matches!(
            ConnectionConfig::from_json(r#"{ "dialect": "sqlite", "colour": "blue" }"#),
            Err(OrmError::Config(_))
        ));
    }
}
